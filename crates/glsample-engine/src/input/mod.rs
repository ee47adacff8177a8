//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! `platform::winit` translates window-system events into `InputEvent`s.

mod frame;
pub mod platform;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{
    ButtonState, InputEvent, Key, Modifiers, MouseButton, MouseWheelDelta, PointerButtonEvent,
};
