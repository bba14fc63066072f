//! Per-window renderer state: the full scene-to-GPU pipeline.

use std::time::Duration;

use crate::coords::{DeviceTransform, Viewport};
use crate::paint::Color;
use crate::render::{MeshBuilder, RenderCommand, RenderComposer};
use crate::scene::{Compositor, UiScene, ViewBuilder};
use crate::submit::{FatalGpuError, FrameOutcome, FrameSubmitter, SubmitBackend, SubmitStats};
use crate::text::{FontSystem, GlyphAtlas};
use crate::time::FrameReport;

/// Renderer tuning. Plain values, fixed at startup.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Framebuffer clear color (premultiplied).
    pub clear_color: Color,
    /// Vertices pre-allocated in each frame slot's staging arena.
    pub initial_vertex_capacity: usize,
    /// How often frame statistics are logged.
    pub stats_interval: Duration,
    /// Glyph atlas edge length in texels.
    pub atlas_size: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::from_srgb_u8(24, 24, 28, 255),
            initial_vertex_capacity: 4096,
            stats_interval: Duration::from_secs(5),
            atlas_size: 1024,
        }
    }
}

/// Everything needed to turn a [`UiScene`] into a presented frame.
///
/// Composition runs inside the frame submitter's fill step, so the vertex
/// stream is built into the staging arena of the slot being filled.
pub struct RendererState<B: SubmitBackend> {
    backend: B,
    config: RendererConfig,
    transform: DeviceTransform,
    compositor: Compositor,
    views: ViewBuilder,
    composer: RenderComposer,
    mesh: MeshBuilder,
    submitter: FrameSubmitter<B>,
    fonts: FontSystem,
    atlas: GlyphAtlas,
}

impl<B: SubmitBackend> RendererState<B> {
    pub fn new(mut backend: B, config: RendererConfig, transform: DeviceTransform) -> Self {
        backend.set_viewport(transform.viewport);
        let submitter = FrameSubmitter::new(&backend, config.initial_vertex_capacity);
        Self {
            backend,
            transform,
            compositor: Compositor::new(),
            views: ViewBuilder::new(),
            composer: RenderComposer::new(),
            mesh: MeshBuilder::new(),
            submitter,
            fonts: FontSystem::new(),
            atlas: GlyphAtlas::new(config.atlas_size),
            config,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn transform(&self) -> &DeviceTransform {
        &self.transform
    }

    pub fn fonts(&self) -> &FontSystem {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut FontSystem {
        &mut self.fonts
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn stats(&self) -> SubmitStats {
        self.submitter.stats()
    }

    /// Applies a new framebuffer size and scale, rebuilding the swapchain.
    pub fn resize(&mut self, viewport: Viewport, scale: f32) -> Result<(), FatalGpuError> {
        self.transform = DeviceTransform::new(scale, viewport);
        if viewport.is_valid() {
            self.submitter.recreate_swapchain(&mut self.backend)?;
        }
        self.backend.set_viewport(viewport);
        Ok(())
    }

    /// Composes, meshes, submits and presents one frame.
    ///
    /// A zero-sized framebuffer skips the frame.
    pub fn draw_frame(&mut self, scene: &UiScene) -> Result<FrameOutcome, FatalGpuError> {
        let Self {
            backend,
            transform,
            compositor,
            views,
            composer,
            mesh,
            submitter,
            fonts,
            atlas,
            ..
        } = self;

        if !transform.viewport.is_valid() {
            return Ok(FrameOutcome::Skipped);
        }

        let outcome = submitter.draw_frame(backend, |backend, arena| {
            let list = compositor.build(&scene.tree, &scene.widgets);
            views.build(&list, &scene.widgets, fonts, atlas, transform);
            if let Err(e) = backend.sync_atlas(atlas) {
                log::warn!("glyph atlas upload failed: {e}");
            }

            let commands: &[RenderCommand] = match composer.build(views.view_models(), views.glyphs(), transform) {
                Ok(commands) => commands,
                Err(e) => {
                    log::error!("render composition failed, drawing an empty frame: {e}");
                    &[]
                }
            };
            log::debug!(
                "frame: {} display items, {} view models, {} glyphs, {} commands",
                list.len(),
                views.view_models().len(),
                views.glyphs().len(),
                commands.len()
            );
            mesh.build(commands, transform, arena)
        })?;

        match outcome {
            FrameOutcome::DeviceRecreated => {
                // New device, new textures: upload the whole atlas again.
                self.atlas.mark_all_dirty();
                self.backend.set_viewport(self.transform.viewport);
            }
            FrameOutcome::SwapchainRecreated => self.backend.set_viewport(self.transform.viewport),
            FrameOutcome::Presented { .. } | FrameOutcome::Skipped => {}
        }
        Ok(outcome)
    }

    /// Logs submission counters together with a frame-rate report.
    pub fn log_stats(&self, report: FrameReport) {
        let s = self.submitter.stats();
        log::info!(
            "{:.1} fps | presented {} skipped {} | swapchain rebuilds {} device rebuilds {} | \
             {} vertices, {} buffer growths, {} mesh failures, {} glyphs cached",
            report.fps(),
            s.presented,
            s.skipped,
            s.swapchain_recreations,
            s.device_recreations,
            s.last_vertex_count,
            s.buffer_growths,
            s.mesh_failures,
            self.atlas.glyph_count()
        );
    }
}
