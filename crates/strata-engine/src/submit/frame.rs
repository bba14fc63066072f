use crate::render::StagingArena;

use super::FenceId;

/// Lifecycle of one [`FrameResources`] slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FrameStage {
    #[default]
    Available,
    /// CPU is building and uploading vertices.
    Filling,
    /// The GPU may still read the vertex buffer until `fence` signals.
    Submitted,
}

/// CPU staging plus the GPU vertex buffer for one in-flight frame.
#[derive(Debug)]
pub struct FrameResources<Buf> {
    pub cpu: StagingArena,
    pub gpu_buffer: Option<Buf>,
    /// Capacity of `gpu_buffer` in vertices.
    pub gpu_capacity: usize,
    pub vertex_count: usize,
    pub stage: FrameStage,
    /// Fence of the last submission that read `gpu_buffer`.
    pub fence: Option<FenceId>,
}

impl<Buf> FrameResources<Buf> {
    pub fn new(initial_vertices: usize) -> Self {
        Self {
            cpu: StagingArena::with_capacity(initial_vertices),
            gpu_buffer: None,
            gpu_capacity: 0,
            vertex_count: 0,
            stage: FrameStage::Available,
            fence: None,
        }
    }

    /// Back to `Available` with no fence. The GPU buffer is kept.
    pub fn reset(&mut self) {
        self.stage = FrameStage::Available;
        self.fence = None;
    }

    /// Forgets the GPU buffer (after device loss).
    pub fn drop_gpu_buffer(&mut self) {
        self.gpu_buffer = None;
        self.gpu_capacity = 0;
        self.reset();
    }
}
