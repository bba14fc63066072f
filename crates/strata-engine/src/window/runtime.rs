use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::{DeviceTransform, Viewport};
use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::renderer::{RendererConfig, RendererState};
use crate::scene::UiScene;
use crate::submit::{FatalGpuError, FrameOutcome};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives frames until the app exits or the GPU
    /// fails fatally. A fatal GPU error is returned after the loop ends.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, renderer: RendererConfig, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, renderer, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal {
            Some(e) => Err(anyhow::Error::new(e).context("renderer stopped")),
            None => Ok(()),
        }
    }
}

// `RendererState<Gpu<'this>>` is invariant in `'this` (the backend is an
// associated type of the submitter), hence `not_covariant`.
#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    scene: UiScene,

    window: Window,

    #[borrows(window)]
    #[not_covariant]
    renderer: RendererState<Gpu<'this>>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    renderer: RendererConfig,
    app: A,

    window: Option<WindowEntry>,
    exit_requested: bool,
    fatal: Option<FatalGpuError>,
}

fn device_viewport(size: PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width as f32, size.height as f32)
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, renderer: RendererConfig, app: A) -> Self {
        Self {
            config,
            gpu_init,
            renderer,
            app,
            window: None,
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let config = self.renderer.clone();
        let clock = FrameClock::new().with_report_interval(config.stats_interval);

        let mut entry = WindowEntryTryBuilder {
            clock,
            scene: UiScene::default(),
            window,
            renderer_builder: |w| {
                let transform = DeviceTransform::new(w.scale_factor() as f32, device_viewport(w.inner_size()));
                pollster::block_on(Gpu::new(w, gpu_init, config.clear_color))
                    .context("GPU initialization failed for window")
                    .map(|gpu| RendererState::new(gpu, config, transform))
            },
        }
        .try_build()?;

        let app = &mut self.app;
        entry.with_renderer_mut(|r| app.on_start(r.fonts_mut()));
        Ok(entry)
    }

    fn resize(&mut self, event_loop: &ActiveEventLoop, size: PhysicalSize<u32>, scale: f64) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        let result = entry.with_renderer_mut(|r| r.resize(device_viewport(size), scale as f32));
        entry.with_window(|w| w.request_redraw());
        if let Err(e) = result {
            self.fail(event_loop, e);
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: FatalGpuError) {
        log::error!("fatal GPU error: {err}");
        self.fatal = Some(err);
        self.request_exit(event_loop);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(entry) = window.as_mut() else {
            return;
        };

        let mut control = AppControl::Continue;
        let result = entry.with_mut(|fields| {
            let time = fields.clock.tick();
            let transform = *fields.renderer.transform();

            fields.scene.clear();
            {
                let mut ctx = FrameCtx {
                    window: WindowCtx { id: window_id, window: fields.window },
                    time,
                    viewport: transform.logical_viewport(),
                    scale_factor: transform.scale,
                    scene: &mut *fields.scene,
                    fonts: fields.renderer.fonts_mut(),
                };
                control = app.on_frame(&mut ctx);
            }

            let outcome = fields.renderer.draw_frame(fields.scene);
            if let Some(report) = fields.clock.take_report() {
                fields.renderer.log_stats(report);
            }
            outcome
        });

        match result {
            Ok(FrameOutcome::Skipped) => log::trace!("frame skipped"),
            Ok(_) => {}
            Err(e) => return self.fail(event_loop, e),
        }
        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                entry.with_window(|w| w.request_redraw());
                self.window = Some(entry);
            }
            Err(e) => {
                log::error!("failed to create initial window: {e:#}");
                self.request_exit(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.window = None;
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                let scale = self
                    .window
                    .as_ref()
                    .map_or(1.0, |e| e.with_window(|w| w.scale_factor()));
                self.resize(event_loop, *new_size, scale);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let Some(size) = self.window.as_ref().map(|e| e.with_window(|w| w.inner_size())) else {
                    return;
                };
                self.resize(event_loop, size, *scale_factor);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }
}
