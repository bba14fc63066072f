use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::Viewport;
use crate::paint::Color;
use crate::render::Vertex;
use crate::submit::{FenceId, GpuFault, SubmitBackend};
use crate::text::GlyphAtlas;

use super::pipeline::{DepthTarget, UiPipeline};
use super::surface;
use super::GpuInit;

/// wgpu objects that are rebuilt together after device loss.
struct DeviceContext<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: UiPipeline,
    depth: DepthTarget,
    // Keep the instance and adapter alive for the surface.
    _adapter: wgpu::Adapter,
    _instance: wgpu::Instance,
}

/// Acquired surface texture waiting for submit and present.
struct Acquired {
    image: usize,
    texture: wgpu::SurfaceTexture,
}

/// wgpu implementation of [`SubmitBackend`], bound to one window.
///
/// wgpu hides the swapchain's images, so the backend keeps a virtual ring
/// of `latency + 1` image slots. Each slot's fence is the submission index
/// of the last frame rendered through it; an empty fence counts as
/// signaled.
pub struct Gpu<'w> {
    window: &'w Window,
    init: GpuInit,
    ctx: DeviceContext<'w>,
    size: PhysicalSize<u32>,
    device_lost: Arc<AtomicBool>,
    fences: Vec<Option<wgpu::SubmissionIndex>>,
    next_image: usize,
    acquired: Option<Acquired>,
    clear: wgpu::Color,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit, clear_color: Color) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let device_lost = Arc::new(AtomicBool::new(false));
        let ctx = create_context(window, &init, size, &device_lost).await?;
        let fences = vec![None; init.image_count()];

        Ok(Self {
            window,
            init,
            ctx,
            size,
            device_lost,
            fences,
            next_image: 0,
            acquired: None,
            clear: wgpu::Color {
                r: f64::from(clear_color.r),
                g: f64::from(clear_color.g),
                b: f64::from(clear_color.b),
                a: f64::from(clear_color.a),
            },
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.ctx.config.format
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.ctx.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.ctx.queue
    }

    fn check_device(&self) -> Result<(), GpuFault> {
        if self.device_lost.load(Ordering::Acquire) {
            Err(GpuFault::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn wait_idle(&self) {
        let _ = self.ctx.device.poll(wgpu::PollType::Wait { submission_index: None, timeout: None });
    }

    fn reset_ring(&mut self) {
        self.acquired = None;
        self.fences.clear();
        self.fences.resize(self.init.image_count(), None);
        self.next_image = 0;
    }
}

async fn create_context<'w>(
    window: &'w Window,
    init: &GpuInit,
    size: PhysicalSize<u32>,
    device_lost: &Arc<AtomicBool>,
) -> Result<DeviceContext<'w>> {
    // Use all backends to allow wgpu to select the optimal platform backend.
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let surface = instance
        .create_surface(window)
        .context("failed to create wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    log::info!("GPU adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("strata-engine device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    device_lost.store(false, Ordering::Release);
    let flag = Arc::clone(device_lost);
    device.set_device_lost_callback(move |reason, message| {
        log::error!("GPU device lost ({reason:?}): {message}");
        flag.store(true, Ordering::Release);
    });

    let surface_caps = surface.get_capabilities(&adapter);
    let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
        .context("no supported surface formats")?;
    let alpha_mode = surface::choose_alpha_mode(&surface_caps, init.alpha_mode);

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: init.present_mode,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    };
    surface.configure(&device, &config);
    log::info!(
        "surface configured: {}x{} {:?} {:?} {:?}",
        config.width,
        config.height,
        format,
        config.present_mode,
        alpha_mode
    );

    let pipeline = UiPipeline::new(&device, format);
    let depth = DepthTarget::new(&device, config.width, config.height);

    Ok(DeviceContext {
        surface,
        device,
        queue,
        config,
        pipeline,
        depth,
        _adapter: adapter,
        _instance: instance,
    })
}

impl SubmitBackend for Gpu<'_> {
    type Buffer = wgpu::Buffer;

    fn image_count(&self) -> usize {
        self.fences.len()
    }

    fn acquire_image(&mut self) -> Result<usize, GpuFault> {
        self.check_device()?;
        if self.size.width == 0 || self.size.height == 0 {
            return Err(GpuFault::Timeout);
        }

        let texture = self
            .ctx
            .surface
            .get_current_texture()
            .map_err(surface::map_surface_error)?;
        if texture.suboptimal {
            return Err(GpuFault::SurfaceSuboptimal);
        }

        let image = self.next_image;
        self.next_image = (self.next_image + 1) % self.fences.len();
        self.acquired = Some(Acquired { image, texture });
        Ok(image)
    }

    fn image_fence(&self, image: usize) -> FenceId {
        FenceId(image as u32)
    }

    fn wait_fence(&mut self, fence: FenceId) -> Result<(), GpuFault> {
        let Some(index) = self.fences.get_mut(fence.0 as usize).and_then(Option::take) else {
            return Ok(());
        };
        self.ctx
            .device
            .poll(wgpu::PollType::Wait { submission_index: Some(index), timeout: None })
            .map(|_| ())
            .map_err(|e| {
                if self.device_lost.load(Ordering::Acquire) {
                    GpuFault::DeviceLost
                } else {
                    GpuFault::Unexpected(e.to_string())
                }
            })
    }

    fn reset_fence(&mut self, fence: FenceId) {
        if let Some(slot) = self.fences.get_mut(fence.0 as usize) {
            *slot = None;
        }
    }

    fn create_vertex_buffer(&mut self, capacity: usize) -> Result<wgpu::Buffer, GpuFault> {
        self.check_device()?;
        let size = (capacity * std::mem::size_of::<Vertex>()) as u64;
        Ok(self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("strata vertex buffer"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }))
    }

    fn write_vertices(&mut self, buffer: &wgpu::Buffer, vertices: &[Vertex]) -> Result<(), GpuFault> {
        self.check_device()?;
        self.ctx.queue.write_buffer(buffer, 0, bytemuck::cast_slice(vertices));
        Ok(())
    }

    fn submit(
        &mut self,
        image: usize,
        buffer: Option<&wgpu::Buffer>,
        vertex_count: usize,
        fence: FenceId,
    ) -> Result<(), GpuFault> {
        self.check_device()?;
        let acquired = match self.acquired.as_ref() {
            Some(a) if a.image == image => a,
            _ => return Err(GpuFault::Unexpected(format!("image {image} was not acquired"))),
        };

        let view = acquired
            .texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("strata frame encoder") });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("strata ui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.ctx.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(buffer) = buffer.filter(|_| vertex_count > 0) {
                self.ctx.pipeline.draw(&mut rpass, buffer, vertex_count as u32);
            }
        }

        let index = self.ctx.queue.submit(std::iter::once(encoder.finish()));
        if let Some(slot) = self.fences.get_mut(fence.0 as usize) {
            *slot = Some(index);
        }
        Ok(())
    }

    fn present(&mut self, image: usize) -> Result<(), GpuFault> {
        let acquired = match self.acquired.take() {
            Some(a) if a.image == image => a,
            _ => return Err(GpuFault::Unexpected(format!("present of unacquired image {image}"))),
        };
        self.window.pre_present_notify();
        acquired.texture.present();
        self.check_device()
    }

    fn recreate_swapchain(&mut self) -> Result<(), GpuFault> {
        self.acquired = None;
        self.wait_idle();
        self.reset_ring();

        let size = self.window.inner_size();
        self.size = size;
        if size.width == 0 || size.height == 0 {
            // wgpu rejects a 0x0 surface; configuration waits for a real size.
            return Ok(());
        }
        self.ctx.config.width = size.width;
        self.ctx.config.height = size.height;
        self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
        self.ctx.depth = DepthTarget::new(&self.ctx.device, size.width, size.height);
        log::info!("swapchain recreated: {}x{}", size.width, size.height);
        Ok(())
    }

    fn recreate_device(&mut self) -> Result<(), GpuFault> {
        self.acquired = None;
        self.wait_idle();
        self.reset_ring();

        let size = self.window.inner_size();
        let ctx = pollster::block_on(create_context(self.window, &self.init, size, &self.device_lost))
            .map_err(|e| GpuFault::Unexpected(format!("{e:#}")))?;
        self.ctx = ctx;
        self.size = size;
        log::info!("GPU device recreated");
        Ok(())
    }

    fn sync_atlas(&mut self, atlas: &mut GlyphAtlas) -> Result<(), GpuFault> {
        self.check_device()?;
        self.ctx.pipeline.sync_atlas(&self.ctx.device, &self.ctx.queue, atlas);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.ctx.pipeline.write_viewport(&self.ctx.queue, viewport);
    }
}
