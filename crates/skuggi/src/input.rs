//! Keyboard input state.
//!
//! [`Input`] tracks which keys are currently held down, fed by the window
//! event handler and read once per frame by the movement step. The camera
//! and light react to *held* keys — one fixed step per frame per held key —
//! so only the pressed set matters here; edge events are tracked anyway for
//! completeness.

use std::collections::HashSet;
use std::hash::Hash;

pub use winit::keyboard::KeyCode;

/// Tracks the state of a set of inputs.
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Call when an input is pressed (from the event handler).
    pub(crate) fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Call when an input is released (from the event handler).
    pub(crate) fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Called at the end of each frame.
    pub(crate) fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_pressed_and_just_pressed() {
        let mut input: Input<u32> = Input::new();
        input.press(7);
        assert!(input.pressed(7));
        assert!(input.just_pressed(7));
    }

    #[test]
    fn holding_across_frames_is_not_just_pressed() {
        let mut input: Input<u32> = Input::new();
        input.press(7);
        input.clear_just();
        input.press(7); // key repeat from the OS
        assert!(input.pressed(7));
        assert!(!input.just_pressed(7), "a held key is not freshly pressed");
    }

    #[test]
    fn release_moves_to_just_released() {
        let mut input: Input<u32> = Input::new();
        input.press(7);
        input.clear_just();
        input.release(7);
        assert!(!input.pressed(7));
        assert!(input.just_released(7));
    }
}
