//! Per-frame input sampling with edge-triggered queries.
//!
//! The host pushes raw [`InputEvent`]s as they arrive. [`InputSampler::update`] is
//! called once per frame and freezes everything seen since the previous update into
//! a snapshot; all queries read that snapshot, so they return the same answer for
//! the whole frame.

use std::collections::HashSet;

use glam::Vec2;

use crate::pick::PointerSample;

/// Pointer buttons. Touch input maps onto `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl PointerButton {
    const COUNT: usize = 3;

    fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Middle => 2,
        }
    }
}

/// Raw device events queued between frames.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to a pixel position (origin top-left).
    PointerMoved { position: Vec2 },
    PointerButton { button: PointerButton, pressed: bool },
    /// Scroll amount in lines, positive away from the user.
    Wheel { delta: f32 },
    /// Physical key identified by its code name (e.g. `"ArrowLeft"`, `"KeyW"`).
    Key { code: String, pressed: bool },
    TouchStart { id: u64, position: Vec2 },
    TouchMove { id: u64, position: Vec2 },
    TouchEnd { id: u64 },
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    buttons_down: [bool; PointerButton::COUNT],
    buttons_pressed: [bool; PointerButton::COUNT],
    keys_down: HashSet<String>,
    keys_pressed: HashSet<String>,
    pointer: Vec2,
    pointer_delta: Vec2,
    wheel: f32,
}

/// Collects device events and exposes a stable per-frame view of them.
#[derive(Debug, Default)]
pub struct InputSampler {
    // Live device state, updated as events arrive.
    buttons_down: [bool; PointerButton::COUNT],
    keys_down: HashSet<String>,
    pointer: Vec2,
    primary_touch: Option<u64>,
    viewport: Vec2,

    // Accumulated since the last update.
    buttons_pressed: [bool; PointerButton::COUNT],
    keys_pressed: HashSet<String>,
    pointer_delta: Vec2,
    wheel: f32,

    frame: Snapshot,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the viewport size in pixels, used for pointer normalization.
    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size;
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Feeds one raw event into the live state.
    pub fn push(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMoved { position } => self.move_pointer(position),
            InputEvent::PointerButton { button, pressed } => self.set_button(button, pressed),
            InputEvent::Wheel { delta } => self.wheel += delta,
            InputEvent::Key { code, pressed } => {
                if pressed {
                    if self.keys_down.insert(code.clone()) {
                        self.keys_pressed.insert(code);
                    }
                } else {
                    self.keys_down.remove(&code);
                }
            }
            InputEvent::TouchStart { id, position } => {
                if self.primary_touch.is_none() {
                    self.primary_touch = Some(id);
                    // Jump without a drag delta, then press.
                    self.pointer = position;
                    self.set_button(PointerButton::Primary, true);
                }
            }
            InputEvent::TouchMove { id, position } => {
                if self.primary_touch == Some(id) {
                    self.move_pointer(position);
                }
            }
            InputEvent::TouchEnd { id } => {
                if self.primary_touch == Some(id) {
                    self.primary_touch = None;
                    self.set_button(PointerButton::Primary, false);
                }
            }
        }
    }

    fn move_pointer(&mut self, position: Vec2) {
        self.pointer_delta += position - self.pointer;
        self.pointer = position;
    }

    fn set_button(&mut self, button: PointerButton, pressed: bool) {
        let i = button.index();
        if pressed && !self.buttons_down[i] {
            self.buttons_pressed[i] = true;
        }
        self.buttons_down[i] = pressed;
    }

    /// Captures the current device state as this frame's snapshot.
    ///
    /// Call exactly once per frame, before any query.
    pub fn update(&mut self) {
        self.frame = Snapshot {
            buttons_down: self.buttons_down,
            buttons_pressed: std::mem::take(&mut self.buttons_pressed),
            keys_down: self.keys_down.clone(),
            keys_pressed: std::mem::take(&mut self.keys_pressed),
            pointer: self.pointer,
            pointer_delta: std::mem::take(&mut self.pointer_delta),
            wheel: std::mem::take(&mut self.wheel),
        };
    }

    /// True only on the frame in which the button went from released to pressed.
    pub fn button_just_pressed(&self, button: PointerButton) -> bool {
        self.frame.buttons_pressed[button.index()]
    }

    pub fn button_down(&self, button: PointerButton) -> bool {
        self.frame.buttons_down[button.index()]
    }

    pub fn key_just_pressed(&self, code: &str) -> bool {
        self.frame.keys_pressed.contains(code)
    }

    pub fn key_down(&self, code: &str) -> bool {
        self.frame.keys_down.contains(code)
    }

    /// Pointer position in pixels at the last update.
    pub fn pointer(&self) -> Vec2 {
        self.frame.pointer
    }

    /// Pointer movement in pixels during the last frame.
    pub fn pointer_delta(&self) -> Vec2 {
        self.frame.pointer_delta
    }

    /// Wheel movement during the last frame.
    pub fn wheel_delta(&self) -> f32 {
        self.frame.wheel
    }

    /// Normalized pointer position, `None` while the viewport is empty.
    pub fn pointer_sample(&self) -> Option<PointerSample> {
        PointerSample::from_pixels(self.frame.pointer, self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(button: PointerButton) -> InputEvent {
        InputEvent::PointerButton {
            button,
            pressed: true,
        }
    }

    fn release(button: PointerButton) -> InputEvent {
        InputEvent::PointerButton {
            button,
            pressed: false,
        }
    }

    #[test]
    fn test_just_pressed_only_on_transition_frame() {
        let mut input = InputSampler::new();
        input.push(press(PointerButton::Primary));

        input.update();
        assert!(input.button_just_pressed(PointerButton::Primary));
        assert!(input.button_down(PointerButton::Primary));

        input.update();
        assert!(!input.button_just_pressed(PointerButton::Primary));
        assert!(input.button_down(PointerButton::Primary));
    }

    #[test]
    fn test_repeated_queries_agree() {
        let mut input = InputSampler::new();
        input.push(press(PointerButton::Primary));
        input.update();
        let first = input.button_just_pressed(PointerButton::Primary);
        let second = input.button_just_pressed(PointerButton::Primary);
        assert!(first && second);
    }

    #[test]
    fn test_press_and_release_between_updates_counts_once() {
        let mut input = InputSampler::new();
        input.push(press(PointerButton::Primary));
        input.push(release(PointerButton::Primary));
        input.push(press(PointerButton::Primary));
        input.push(release(PointerButton::Primary));

        input.update();
        assert!(input.button_just_pressed(PointerButton::Primary));
        assert!(!input.button_down(PointerButton::Primary));

        input.update();
        assert!(!input.button_just_pressed(PointerButton::Primary));
    }

    #[test]
    fn test_events_after_update_wait_for_next_frame() {
        let mut input = InputSampler::new();
        input.update();
        input.push(press(PointerButton::Secondary));
        assert!(!input.button_just_pressed(PointerButton::Secondary));
        input.update();
        assert!(input.button_just_pressed(PointerButton::Secondary));
    }

    #[test]
    fn test_never_pressed_without_events() {
        let mut input = InputSampler::new();
        input.update();
        assert!(!input.button_just_pressed(PointerButton::Primary));
        assert!(!input.key_just_pressed("ArrowUp"));
        assert!(!input.key_down("ArrowUp"));
    }

    #[test]
    fn test_keys() {
        let mut input = InputSampler::new();
        input.push(InputEvent::Key {
            code: "ArrowLeft".into(),
            pressed: true,
        });
        input.update();
        assert!(input.key_just_pressed("ArrowLeft"));
        assert!(input.key_down("ArrowLeft"));

        // Auto-repeat press while held is not a new edge
        input.push(InputEvent::Key {
            code: "ArrowLeft".into(),
            pressed: true,
        });
        input.update();
        assert!(!input.key_just_pressed("ArrowLeft"));
        assert!(input.key_down("ArrowLeft"));
    }

    #[test]
    fn test_pointer_delta_and_wheel_reset_each_frame() {
        let mut input = InputSampler::new();
        input.push(InputEvent::PointerMoved {
            position: Vec2::new(10.0, 10.0),
        });
        input.push(InputEvent::PointerMoved {
            position: Vec2::new(15.0, 8.0),
        });
        input.push(InputEvent::Wheel { delta: 1.5 });
        input.update();
        assert_eq!(input.pointer(), Vec2::new(15.0, 8.0));
        assert_eq!(input.pointer_delta(), Vec2::new(15.0, 8.0));
        assert!((input.wheel_delta() - 1.5).abs() < f32::EPSILON);

        input.update();
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        assert_eq!(input.wheel_delta(), 0.0);
        assert_eq!(input.pointer(), Vec2::new(15.0, 8.0));
    }

    #[test]
    fn test_first_touch_is_primary_pointer() {
        let mut input = InputSampler::new();
        input.set_viewport(Vec2::new(100.0, 100.0));
        input.push(InputEvent::TouchStart {
            id: 7,
            position: Vec2::new(50.0, 50.0),
        });
        input.push(InputEvent::TouchStart {
            id: 8,
            position: Vec2::new(90.0, 90.0),
        });
        input.update();

        assert!(input.button_just_pressed(PointerButton::Primary));
        assert_eq!(input.pointer(), Vec2::new(50.0, 50.0));
        assert_eq!(input.pointer_delta(), Vec2::ZERO);
        assert!(input.pointer_sample().unwrap().ndc().length() < 1e-6);

        input.push(InputEvent::TouchEnd { id: 8 });
        input.update();
        assert!(input.button_down(PointerButton::Primary));

        input.push(InputEvent::TouchEnd { id: 7 });
        input.update();
        assert!(!input.button_down(PointerButton::Primary));
    }

    #[test]
    fn test_no_sample_without_viewport() {
        let mut input = InputSampler::new();
        input.update();
        assert!(input.pointer_sample().is_none());
    }
}
