use std::collections::HashSet;

use super::frame::InputFrame;
use super::types::{ButtonState, InputEvent, Key, MouseButton, PointerButtonEvent};

/// Current input state for the sample window.
///
/// Holds "is down" information and current pointer position.
/// Per-frame transitions are recorded into an `InputFrame`.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: super::Modifiers,
    pub focused: bool,

    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies an input event to the current state and writes deltas to `frame`.
    pub fn apply_event(&mut self, frame: &mut InputFrame, ev: InputEvent) {
        match &ev {
            InputEvent::ModifiersChanged(m) => {
                self.modifiers = *m;
            }

            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Avoids stuck keys/buttons when focus changes mid-press.
                    self.keys_down.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved { x, y } => {
                if let Some((px, py)) = self.pointer_pos {
                    frame.pointer_delta.0 += x - px;
                    frame.pointer_delta.1 += y - py;
                }
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(*key) {
                        frame.keys_pressed.insert(*key);
                    }
                }
                ButtonState::Released => {
                    if self.keys_down.remove(key) {
                        frame.keys_released.insert(*key);
                    }
                }
            },

            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y }) => {
                self.pointer_pos = Some((*x, *y));

                match state {
                    ButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            frame.buttons_pressed.insert(*button);
                        }
                    }
                    ButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            frame.buttons_released.insert(*button);
                        }
                    }
                }
            }

            InputEvent::MouseWheel(delta) => {
                frame.wheel_lines += delta.lines_y();
            }
        }

        frame.push_event(ev);
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseWheelDelta;

    fn key(key: Key, state: ButtonState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn repeated_press_records_single_transition() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::W, ButtonState::Pressed));
        state.apply_event(&mut frame, key(Key::W, ButtonState::Pressed));

        assert!(state.key_down(Key::W));
        assert_eq!(frame.keys_pressed.len(), 1);
        assert_eq!(frame.events.len(), 2);
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, key(Key::A, ButtonState::Pressed));
        state.apply_event(&mut frame, InputEvent::Focused(false));

        assert!(!state.key_down(Key::A));
    }

    #[test]
    fn pointer_delta_accumulates_between_moves() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        assert_eq!(frame.pointer_delta, (0.0, 0.0));

        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 15.0, y: 8.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 20.0, y: 8.0 });
        assert_eq!(frame.pointer_delta, (10.0, -2.0));

        frame.clear();
        assert_eq!(frame.pointer_delta, (0.0, 0.0));
    }

    #[test]
    fn pixel_wheel_is_normalized_to_lines() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 1.0 }));
        state.apply_event(&mut frame, InputEvent::MouseWheel(MouseWheelDelta::Pixel { x: 0.0, y: 80.0 }));

        assert!((frame.wheel_lines - 3.0).abs() < 1e-6);
    }
}
