//! Time subsystem.
//!
//! One `FrameClock` per run loop; call `tick()` once per presented frame.
//! `FpsCounter` averages the frame rate over a fixed sample window.

mod fps;
mod frame_clock;

pub use fps::FpsCounter;
pub use frame_clock::{FrameClock, FrameTime};
