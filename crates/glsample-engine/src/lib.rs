//! glsample engine crate.
//!
//! Owns the window bootstrap, the sample lifecycle contract and the small set
//! of GPU helpers every sample program shares.

pub mod args;
pub mod camera;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod text;
pub mod time;
pub mod window;

pub use crate::core::{run_sample, Sample};
