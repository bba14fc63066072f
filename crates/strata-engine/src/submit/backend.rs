use std::fmt;

use crate::coords::Viewport;
use crate::render::Vertex;
use crate::text::GlyphAtlas;

/// Handle to a GPU completion signal owned by the backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FenceId(pub u32);

/// Non-success outcome of a backend operation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GpuFault {
    /// The swapchain no longer matches the surface.
    SurfaceOutOfDate,
    /// The swapchain still works but should be rebuilt.
    SurfaceSuboptimal,
    /// The logical device is gone; every GPU resource must be rebuilt.
    DeviceLost,
    /// Image acquisition timed out; the frame is skipped.
    Timeout,
    /// Anything else. Fatal.
    Unexpected(String),
}

impl GpuFault {
    /// Out-of-date, suboptimal and device-lost are handled by rebuilding.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, GpuFault::Unexpected(_))
    }
}

impl fmt::Display for GpuFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuFault::SurfaceOutOfDate => f.write_str("surface is out of date"),
            GpuFault::SurfaceSuboptimal => f.write_str("surface is suboptimal"),
            GpuFault::DeviceLost => f.write_str("device lost"),
            GpuFault::Timeout => f.write_str("timed out"),
            GpuFault::Unexpected(msg) => write!(f, "unexpected result: {msg}"),
        }
    }
}

impl std::error::Error for GpuFault {}

/// Unrecoverable GPU failure, naming the operation that produced it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FatalGpuError {
    pub operation: &'static str,
    pub fault: GpuFault,
}

impl fmt::Display for FatalGpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.fault)
    }
}

impl std::error::Error for FatalGpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.fault)
    }
}

/// The GPU operations the frame submitter drives.
///
/// Fences follow binary semantics: created signaled, unsignaled by
/// [`reset_fence`](Self::reset_fence), signaled again once the submission
/// that names them completes. [`wait_fence`](Self::wait_fence) never times
/// out.
pub trait SubmitBackend {
    /// GPU vertex buffer handle.
    type Buffer;

    /// Number of presentable images in the current swapchain.
    fn image_count(&self) -> usize;

    /// Blocks until an image is available and returns its index.
    fn acquire_image(&mut self) -> Result<usize, GpuFault>;

    /// The fence signaled by the last submission rendering to `image`.
    fn image_fence(&self, image: usize) -> FenceId;

    fn wait_fence(&mut self, fence: FenceId) -> Result<(), GpuFault>;

    fn reset_fence(&mut self, fence: FenceId);

    /// Allocates a vertex buffer holding at least `capacity` vertices.
    fn create_vertex_buffer(&mut self, capacity: usize) -> Result<Self::Buffer, GpuFault>;

    /// Uploads `vertices` to the start of `buffer`.
    ///
    /// Callers guarantee no in-flight submission still reads `buffer`.
    fn write_vertices(&mut self, buffer: &Self::Buffer, vertices: &[Vertex]) -> Result<(), GpuFault>;

    /// Records and submits the draw for `image`, signaling `fence` on completion.
    fn submit(
        &mut self,
        image: usize,
        buffer: Option<&Self::Buffer>,
        vertex_count: usize,
        fence: FenceId,
    ) -> Result<(), GpuFault>;

    fn present(&mut self, image: usize) -> Result<(), GpuFault>;

    /// Drains outstanding work and rebuilds the swapchain.
    fn recreate_swapchain(&mut self) -> Result<(), GpuFault>;

    /// Drains outstanding work and rebuilds the device, surface and every
    /// GPU resource. Buffers created before the call are invalid after it.
    fn recreate_device(&mut self) -> Result<(), GpuFault>;

    /// Uploads the atlas region touched since the last sync.
    fn sync_atlas(&mut self, atlas: &mut GlyphAtlas) -> Result<(), GpuFault> {
        let _ = atlas.take_dirty();
        Ok(())
    }

    /// Framebuffer size used by the vertex shader to reach NDC.
    fn set_viewport(&mut self, viewport: Viewport);
}
