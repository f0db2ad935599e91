//! Orbit camera controls for the non-immersive view.

use glam::Vec2;

use crate::camera::Camera;
use crate::input::{InputSampler, PointerButton};

/// Arrow keys and the pan direction they produce (screen right, screen up).
const PAN_KEYS: [(&str, Vec2); 4] = [
    ("ArrowLeft", Vec2::new(1.0, 0.0)),
    ("ArrowRight", Vec2::new(-1.0, 0.0)),
    ("ArrowUp", Vec2::new(0.0, 1.0)),
    ("ArrowDown", Vec2::new(0.0, -1.0)),
];

/// Orbit, pan and zoom around the camera target, with optional damping.
///
/// - primary drag: orbit
/// - secondary drag: pan
/// - wheel: zoom
/// - arrow keys: pan
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per 60 Hz frame when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    /// Pixels panned per key press.
    pub key_pan_speed: f32,
    pending_orbit: Vec2,
    pending_pan: Vec2,
    pending_zoom: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            key_pan_speed: 7.0,
            pending_orbit: Vec2::ZERO,
            pending_pan: Vec2::ZERO,
            pending_zoom: 0.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while damped motion is still being applied.
    pub fn is_moving(&self) -> bool {
        self.pending_orbit.length_squared() > 1e-10
            || self.pending_pan.length_squared() > 1e-10
            || self.pending_zoom.abs() > 1e-5
    }

    /// Advances the controls by `dt` seconds using this frame's input.
    pub fn update(&mut self, camera: &mut Camera, input: &InputSampler, dt: f32) {
        let height = input.viewport().y.max(1.0);
        let distance = camera.position.distance(camera.target);
        // World units covered by one pixel at the target distance.
        let pixel_scale = 2.0 * distance * (camera.fov * 0.5).tan() / height;

        let delta = input.pointer_delta();
        if input.button_down(PointerButton::Primary) {
            self.pending_orbit +=
                delta * std::f32::consts::TAU / height * self.rotate_speed;
        }
        if input.button_down(PointerButton::Secondary) {
            self.pending_pan += Vec2::new(-delta.x, delta.y) * pixel_scale * self.pan_speed;
        }
        for (code, direction) in PAN_KEYS {
            if input.key_just_pressed(code) {
                self.pending_pan += direction * self.key_pan_speed * pixel_scale * self.pan_speed;
            }
        }
        let wheel = input.wheel_delta();
        if wheel != 0.0 {
            self.pending_zoom += wheel * distance * 0.1 * self.zoom_speed;
        }

        let portion = if self.enable_damping {
            let frames = (dt * 60.0).clamp(0.0, 10.0);
            1.0 - (1.0 - self.damping_factor).powf(frames)
        } else {
            1.0
        };

        let orbit = self.pending_orbit * portion;
        let pan = self.pending_pan * portion;
        let zoom = self.pending_zoom * portion;
        self.pending_orbit -= orbit;
        self.pending_pan -= pan;
        self.pending_zoom -= zoom;

        if orbit != Vec2::ZERO {
            camera.orbit(orbit.x, orbit.y);
        }
        if pan != Vec2::ZERO {
            camera.pan(pan.x, pan.y);
        }
        if zoom != 0.0 {
            camera.zoom(zoom);
        }
    }
}
