//! GPU rendering helpers shared by the samples.
//!
//! Each sample is responsible for its own GPU resources (pipelines, buffers).
//! Handles created through [`RenderCtx`] are registered with the sample's
//! [`Ledger`] so release can be audited.

pub mod common;
mod ctx;
pub mod geometry;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
mod ledger;
mod ring;
mod target;
pub mod texture;

pub use ctx::{RenderCtx, RenderTarget};
pub use geometry::{GeometryObject, MeshData};
pub use ledger::{Ledger, ResourceKind, Tracked};
pub use ring::{RingLayout, UniformRing};
pub use target::{SizedTexture, TargetError, TargetExtent};
