/// Which frame-resource slot last submitted to each swapchain image.
#[derive(Debug, Clone, Default)]
pub struct ImageOwners {
    slots: Vec<Option<usize>>,
}

impl ImageOwners {
    pub fn new(image_count: usize) -> Self {
        Self { slots: vec![None; image_count] }
    }

    /// Clears every entry and resizes for a rebuilt swapchain.
    pub fn reset(&mut self, image_count: usize) {
        self.slots.clear();
        self.slots.resize(image_count, None);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn owner(&self, image: usize) -> Option<usize> {
        self.slots.get(image).copied().flatten()
    }

    pub fn claim(&mut self, image: usize, frame: usize) {
        if image >= self.slots.len() {
            self.slots.resize(image + 1, None);
        }
        self.slots[image] = Some(frame);
    }

    pub fn release(&mut self, image: usize) -> Option<usize> {
        self.slots.get_mut(image).and_then(Option::take)
    }
}
