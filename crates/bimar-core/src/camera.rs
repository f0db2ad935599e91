//! Perspective camera and view rays.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::pick::Ray;

/// A perspective camera looking at a target point.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Camera {
    /// Creates a new camera with default settings.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 60f32.to_radians(),
            aspect_ratio,
            near: 0.1,
            far: 1.0e4,
        }
    }

    /// Sets the aspect ratio; degenerate sizes are ignored.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Returns the view matrix.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Returns the projection matrix (wgpu depth range `[0, 1]`).
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Returns the combined view-projection matrix.
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Returns the camera's forward direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Returns the camera's right direction.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Ray from the near plane through a point given in normalized device coordinates.
    #[must_use]
    pub fn ray_through(&self, ndc: Vec2) -> Option<Ray> {
        let inv_view_proj = self.view_projection_matrix().inverse();

        let near = inv_view_proj * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        if near.w.abs() < 1e-9 || far.w.abs() < 1e-9 {
            return None;
        }

        let origin = near.truncate() / near.w;
        let direction = (far.truncate() / far.w - origin).normalize_or_zero();
        if direction.length_squared() < 1e-12 {
            return None;
        }

        Some(Ray { origin, direction })
    }

    /// Orbits the camera around the target.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius < 1e-6 {
            return;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta -= delta_x;
        phi = (phi - delta_y).clamp(0.01, std::f32::consts::PI - 0.01);

        self.position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
    }

    /// Pans the camera and its target together.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let right = self.right();
        let up = right.cross(self.forward());
        let offset = right * delta_x + up * delta_y;
        self.position += offset;
        self.target += offset;
    }

    /// Moves toward (positive delta) or away from the target.
    pub fn zoom(&mut self, delta: f32) {
        let direction = self.forward();
        let distance = (self.position - self.target).length();
        let new_distance = (distance - delta).max(self.near * 2.0);
        self.position = self.target - direction * new_distance;
    }

    /// Resets the camera to look at the given bounding box.
    pub fn look_at_box(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let size = (max - min).length().max(1e-3);

        self.target = center;
        self.position = center + Vec3::new(0.0, size * 0.5, size * 1.5);
        self.near = (size * 0.001).max(1e-3);
        self.far = size * 100.0;
    }

    /// Sets the field of view in radians.
    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(0.1, std::f32::consts::PI - 0.1);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_neg_z() -> Camera {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 5.0);
        camera.target = Vec3::ZERO;
        camera
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = looking_down_neg_z();
        let ray = camera.ray_through(Vec2::ZERO).unwrap();
        assert!(ray.direction.distance(Vec3::NEG_Z) < 1e-4);
        assert!(ray.origin.x.abs() < 1e-4 && ray.origin.y.abs() < 1e-4);
    }

    #[test]
    fn test_corner_ray_diverges() {
        let camera = looking_down_neg_z();
        let ray = camera.ray_through(Vec2::new(1.0, 1.0)).unwrap();
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
    }

    #[test]
    fn test_set_fov_clamping() {
        let mut camera = Camera::new(1.0);
        camera.set_fov(0.0);
        assert!(camera.fov >= 0.1);

        camera.set_fov(std::f32::consts::PI);
        assert!(camera.fov < std::f32::consts::PI);
    }

    #[test]
    fn test_zoom_moves_toward_target() {
        let mut camera = looking_down_neg_z();
        let initial_distance = camera.position.distance(camera.target);
        camera.zoom(1.0);
        assert!(camera.position.distance(camera.target) < initial_distance);
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let mut camera = looking_down_neg_z();
        camera.orbit(0.3, 0.2);
        assert!((camera.position.distance(camera.target) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_pan_moves_target() {
        let mut camera = looking_down_neg_z();
        camera.pan(1.0, 0.0);
        assert!((camera.target.x - 1.0).abs() < 1e-5);
        assert!((camera.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_aspect_ignored() {
        let mut camera = Camera::new(2.0);
        camera.set_aspect_ratio(0.0);
        assert!((camera.aspect_ratio - 2.0).abs() < f32::EPSILON);
    }
}
