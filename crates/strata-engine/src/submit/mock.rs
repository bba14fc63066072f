//! Fence-simulating backend for tests.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::coords::Viewport;
use crate::render::Vertex;
use crate::text::{DirtyRegion, GlyphAtlas};

use super::{FenceId, GpuFault, SubmitBackend};

#[derive(Debug)]
pub(crate) struct MockBuffer {
    id: usize,
    capacity: usize,
    generation: u32,
}

/// A fence carries the serial of the submission it will signal. Fence ids
/// are reused, serials never are.
#[derive(Debug, Copy, Clone)]
struct MockFence {
    signaled: bool,
    pending: Option<u64>,
}

impl MockFence {
    const SIGNALED: MockFence = MockFence { signaled: true, pending: None };
}

/// Simulated GPU. Submissions complete only when their fence is waited
/// on, so any missing wait shows up as an overwrite of a buffer that is
/// still "in flight".
///
/// Buffers are tracked by submission serial rather than fence id: a fence
/// resubmitted by another slot says nothing about the buffer's own frame.
pub(crate) struct MockGpu {
    fences: Vec<MockFence>,
    pub(crate) acquire_script: VecDeque<Result<usize, GpuFault>>,
    pub(crate) present_script: VecDeque<Result<(), GpuFault>>,
    pub(crate) submit_fault: Option<GpuFault>,
    next_image: usize,
    pub(crate) image_count_after_recreate: Option<usize>,
    generation: u32,
    pub(crate) buffers_created: usize,
    next_serial: u64,
    in_flight: HashSet<u64>,
    buffer_serials: HashMap<usize, (u64, FenceId)>,
    pub(crate) waits: Vec<FenceId>,
    pub(crate) submissions: Vec<(usize, usize)>,
    pub(crate) uploads: Vec<usize>,
    pub(crate) viewports: Vec<Viewport>,
    pub(crate) atlas_syncs: Vec<Option<DirtyRegion>>,
}

impl MockGpu {
    pub(crate) fn new(images: usize) -> Self {
        Self {
            fences: vec![MockFence::SIGNALED; images],
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            submit_fault: None,
            next_image: 0,
            image_count_after_recreate: None,
            generation: 0,
            buffers_created: 0,
            next_serial: 0,
            in_flight: HashSet::new(),
            buffer_serials: HashMap::new(),
            waits: Vec::new(),
            submissions: Vec::new(),
            uploads: Vec::new(),
            viewports: Vec::new(),
            atlas_syncs: Vec::new(),
        }
    }

    pub(crate) fn scripted(images: usize, acquire: impl IntoIterator<Item = Result<usize, GpuFault>>) -> Self {
        let mut gpu = Self::new(images);
        gpu.acquire_script = acquire.into_iter().collect();
        gpu
    }

    fn drain(&mut self) {
        self.fences.iter_mut().for_each(|f| *f = MockFence::SIGNALED);
        self.in_flight.clear();
    }
}

impl SubmitBackend for MockGpu {
    type Buffer = MockBuffer;

    fn image_count(&self) -> usize {
        self.fences.len()
    }

    fn acquire_image(&mut self) -> Result<usize, GpuFault> {
        if let Some(next) = self.acquire_script.pop_front() {
            return next;
        }
        let image = self.next_image % self.fences.len();
        self.next_image += 1;
        Ok(image)
    }

    fn image_fence(&self, image: usize) -> FenceId {
        FenceId(image as u32)
    }

    fn wait_fence(&mut self, fence: FenceId) -> Result<(), GpuFault> {
        self.waits.push(fence);
        let f = &mut self.fences[fence.0 as usize];
        if !f.signaled {
            let Some(serial) = f.pending else {
                panic!("deadlock: waiting on {fence:?} with no pending submission");
            };
            *f = MockFence::SIGNALED;
            self.in_flight.remove(&serial);
        }
        Ok(())
    }

    fn reset_fence(&mut self, fence: FenceId) {
        let f = &mut self.fences[fence.0 as usize];
        assert!(f.pending.is_none(), "reset of {fence:?} while its submission is in flight");
        f.signaled = false;
    }

    fn create_vertex_buffer(&mut self, capacity: usize) -> Result<MockBuffer, GpuFault> {
        self.buffers_created += 1;
        Ok(MockBuffer { id: self.buffers_created, capacity, generation: self.generation })
    }

    fn write_vertices(&mut self, buffer: &MockBuffer, vertices: &[Vertex]) -> Result<(), GpuFault> {
        assert_eq!(buffer.generation, self.generation, "buffer from a lost device");
        assert!(vertices.len() <= buffer.capacity);
        if let Some((serial, fence)) = self.buffer_serials.get(&buffer.id) {
            assert!(
                !self.in_flight.contains(serial),
                "buffer {} overwritten while submission {serial} on {fence:?} is in flight",
                buffer.id
            );
        }
        self.uploads.push(vertices.len());
        Ok(())
    }

    fn submit(
        &mut self,
        image: usize,
        buffer: Option<&MockBuffer>,
        vertex_count: usize,
        fence: FenceId,
    ) -> Result<(), GpuFault> {
        if let Some(fault) = self.submit_fault.take() {
            return Err(fault);
        }
        let f = &mut self.fences[fence.0 as usize];
        assert!(!f.signaled && f.pending.is_none(), "submit with a fence that was not reset");
        let serial = self.next_serial;
        self.next_serial += 1;
        f.pending = Some(serial);
        self.in_flight.insert(serial);
        if let Some(b) = buffer {
            self.buffer_serials.insert(b.id, (serial, fence));
        }
        self.submissions.push((image, vertex_count));
        Ok(())
    }

    fn present(&mut self, _image: usize) -> Result<(), GpuFault> {
        self.present_script.pop_front().unwrap_or(Ok(()))
    }

    fn recreate_swapchain(&mut self) -> Result<(), GpuFault> {
        self.drain();
        if let Some(n) = self.image_count_after_recreate.take() {
            self.fences = vec![MockFence::SIGNALED; n];
        }
        self.next_image = 0;
        Ok(())
    }

    fn recreate_device(&mut self) -> Result<(), GpuFault> {
        self.drain();
        self.generation += 1;
        self.buffer_serials.clear();
        self.next_image = 0;
        Ok(())
    }

    fn sync_atlas(&mut self, atlas: &mut GlyphAtlas) -> Result<(), GpuFault> {
        self.atlas_syncs.push(atlas.take_dirty());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewports.push(viewport);
    }
}
