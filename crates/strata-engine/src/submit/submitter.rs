use crate::render::{MeshError, MeshStats, StagingArena};

use super::{FatalGpuError, FrameResources, FrameStage, GpuFault, ImageOwners, SubmitBackend};

/// Number of [`FrameResources`] slots the submitter alternates between.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Smallest GPU vertex buffer ever allocated.
const MIN_GPU_VERTICES: usize = 64;

/// What happened to one call of [`FrameSubmitter::draw_frame`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented { vertices: usize },
    /// Acquisition timed out; nothing was touched.
    Skipped,
    SwapchainRecreated,
    DeviceRecreated,
}

/// Running counters, reported periodically by the renderer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SubmitStats {
    pub presented: u64,
    pub skipped: u64,
    pub swapchain_recreations: u64,
    pub device_recreations: u64,
    pub buffer_growths: u64,
    pub mesh_failures: u64,
    pub last_vertex_count: usize,
}

/// Double-buffered frame submission.
///
/// Two frame slots alternate by cursor. Before a slot is refilled, every
/// submission that may still read its vertex buffer has completed: the
/// acquired image's fence, the fence of whichever slot last rendered to
/// that image, and the slot's own last fence.
pub struct FrameSubmitter<B: SubmitBackend> {
    frames: [FrameResources<B::Buffer>; FRAMES_IN_FLIGHT],
    cursor: usize,
    owners: ImageOwners,
    stats: SubmitStats,
}

type StepResult<T> = Result<T, (&'static str, GpuFault)>;

impl<B: SubmitBackend> FrameSubmitter<B> {
    pub fn new(backend: &B, initial_vertices: usize) -> Self {
        Self {
            frames: std::array::from_fn(|_| FrameResources::new(initial_vertices)),
            cursor: 0,
            owners: ImageOwners::new(backend.image_count()),
            stats: SubmitStats::default(),
        }
    }

    pub fn stats(&self) -> SubmitStats {
        self.stats
    }

    /// Slot the next frame will fill.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn frame(&self, slot: usize) -> Option<&FrameResources<B::Buffer>> {
        self.frames.get(slot)
    }

    pub fn owners(&self) -> &ImageOwners {
        &self.owners
    }

    /// Runs one frame: acquire, wait, fill, upload, submit, present.
    ///
    /// `fill` rebuilds the vertex stream into the slot's staging arena and
    /// may touch the backend (atlas uploads). A failed mesh build is logged
    /// and the frame is drawn empty. Recoverable GPU faults rebuild the
    /// swapchain or device and return `Ok`; only unexpected results are
    /// returned as errors.
    pub fn draw_frame<F>(&mut self, backend: &mut B, fill: F) -> Result<FrameOutcome, FatalGpuError>
    where
        F: FnOnce(&mut B, &mut StagingArena) -> Result<MeshStats, MeshError>,
    {
        let image = match backend.acquire_image() {
            Ok(image) => image,
            Err(fault) => return self.recover(backend, "acquire_image", fault),
        };

        match self.record(backend, image, fill) {
            Ok(vertices) => {
                self.stats.presented += 1;
                self.stats.last_vertex_count = vertices;
                Ok(FrameOutcome::Presented { vertices })
            }
            Err((operation, fault)) => self.recover(backend, operation, fault),
        }
    }

    /// Rebuilds the swapchain outside the frame loop (window resize).
    pub fn recreate_swapchain(&mut self, backend: &mut B) -> Result<(), FatalGpuError> {
        backend
            .recreate_swapchain()
            .map_err(|fault| FatalGpuError { operation: "recreate_swapchain", fault })?;
        self.reset_slots(backend.image_count());
        self.stats.swapchain_recreations += 1;
        Ok(())
    }

    fn record<F>(&mut self, backend: &mut B, image: usize, fill: F) -> StepResult<usize>
    where
        F: FnOnce(&mut B, &mut StagingArena) -> Result<MeshStats, MeshError>,
    {
        let image_fence = backend.image_fence(image);
        backend.wait_fence(image_fence).map_err(|f| ("wait_fence", f))?;

        // A slot that rendered to this image earlier may have moved on to
        // another image since; its buffer is only free once that signals.
        if let Some(owner) = self.owners.release(image) {
            let prev = &mut self.frames[owner];
            if prev.stage == FrameStage::Submitted {
                if let Some(fence) = prev.fence.filter(|f| *f != image_fence) {
                    backend.wait_fence(fence).map_err(|f| ("wait_fence", f))?;
                }
                prev.stage = FrameStage::Available;
            }
        }

        let slot = self.cursor;
        let frame = &mut self.frames[slot];
        if frame.stage == FrameStage::Submitted {
            if let Some(fence) = frame.fence {
                backend.wait_fence(fence).map_err(|f| ("wait_fence", f))?;
            }
            frame.stage = FrameStage::Available;
        }
        debug_assert_eq!(frame.stage, FrameStage::Available);
        frame.stage = FrameStage::Filling;

        let count = match fill(backend, &mut frame.cpu) {
            Ok(mesh) => {
                log::trace!(
                    "mesh: {} quads, {} glyphs, {} culled, {} vertices",
                    mesh.background_quads,
                    mesh.glyph_quads,
                    mesh.culled,
                    mesh.vertex_count
                );
                frame.cpu.vertices().len()
            }
            Err(e) => {
                log::error!("mesh build failed, drawing an empty frame: {e}");
                self.stats.mesh_failures += 1;
                0
            }
        };

        if count > frame.gpu_capacity {
            let capacity = count.next_power_of_two().max(MIN_GPU_VERTICES);
            let buffer = backend
                .create_vertex_buffer(capacity)
                .map_err(|f| ("create_vertex_buffer", f))?;
            log::debug!("frame slot {slot}: vertex buffer grown {} -> {capacity}", frame.gpu_capacity);
            frame.gpu_buffer = Some(buffer);
            frame.gpu_capacity = capacity;
            self.stats.buffer_growths += 1;
        }
        if count > 0 {
            if let Some(buffer) = frame.gpu_buffer.as_ref() {
                backend
                    .write_vertices(buffer, &frame.cpu.vertices()[..count])
                    .map_err(|f| ("write_vertices", f))?;
            }
        }
        frame.vertex_count = count;

        backend.reset_fence(image_fence);
        backend
            .submit(image, frame.gpu_buffer.as_ref(), count, image_fence)
            .map_err(|f| ("submit", f))?;
        frame.stage = FrameStage::Submitted;
        frame.fence = Some(image_fence);
        self.owners.claim(image, slot);
        self.cursor = (slot + 1) % FRAMES_IN_FLIGHT;

        backend.present(image).map_err(|f| ("present", f))?;
        Ok(count)
    }

    fn recover(
        &mut self,
        backend: &mut B,
        operation: &'static str,
        fault: GpuFault,
    ) -> Result<FrameOutcome, FatalGpuError> {
        match fault {
            GpuFault::SurfaceOutOfDate | GpuFault::SurfaceSuboptimal => {
                log::info!("{operation}: {fault}; recreating swapchain");
                self.recreate_swapchain(backend)?;
                Ok(FrameOutcome::SwapchainRecreated)
            }
            GpuFault::DeviceLost => {
                log::warn!("{operation}: device lost; recreating device");
                backend
                    .recreate_device()
                    .map_err(|fault| FatalGpuError { operation: "recreate_device", fault })?;
                for frame in &mut self.frames {
                    frame.drop_gpu_buffer();
                }
                self.reset_slots(backend.image_count());
                self.stats.device_recreations += 1;
                Ok(FrameOutcome::DeviceRecreated)
            }
            GpuFault::Timeout => {
                log::warn!("{operation} timed out; skipping frame");
                for frame in &mut self.frames {
                    if frame.stage == FrameStage::Filling {
                        frame.stage = FrameStage::Available;
                    }
                }
                self.stats.skipped += 1;
                Ok(FrameOutcome::Skipped)
            }
            GpuFault::Unexpected(_) => {
                log::error!("{operation} failed: {fault}");
                Err(FatalGpuError { operation, fault })
            }
        }
    }

    fn reset_slots(&mut self, image_count: usize) {
        for frame in &mut self.frames {
            frame.reset();
        }
        self.owners.reset(image_count);
        self.cursor = 0;
    }
}
