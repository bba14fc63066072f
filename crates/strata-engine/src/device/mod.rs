//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - implementing the frame submitter's backend on top of them

mod gpu;
mod init;
mod pipeline;
mod surface;

pub use gpu::Gpu;
pub use init::GpuInit;
