//! Double-buffered frame submission.
//!
//! The protocol lives here; GPU specifics sit behind [`SubmitBackend`] so
//! the fence and ownership rules can be exercised without a device.

mod backend;
mod frame;
mod owners;
mod submitter;

pub use backend::{FatalGpuError, FenceId, GpuFault, SubmitBackend};
pub use frame::{FrameResources, FrameStage};
pub use owners::ImageOwners;
pub use submitter::{FrameOutcome, FrameSubmitter, SubmitStats, FRAMES_IN_FLIGHT};

#[cfg(test)]
pub(crate) mod mock;
