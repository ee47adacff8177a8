//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - verifying the capabilities a sample depends on
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering

mod capabilities;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use capabilities::{AdapterCapabilities, Capability, CapabilityError};
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::{device_limits, experimental_features, BaselineState, GpuInit};
