//! Window + runtime loop.
//!
//! `bootstrap` creates and destroys the window/GPU pair; `runtime` owns the
//! `winit` event loop and drives a [`crate::Sample`] through it.

mod bootstrap;
mod runtime;

pub use bootstrap::{create_window, delete_window, WindowHandle};
pub use runtime::{Runtime, RuntimeConfig};
