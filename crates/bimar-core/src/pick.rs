//! Ray picking against the scene graph.

use glam::{Vec2, Vec3};

use crate::camera::Camera;
use crate::scene::{NodeId, NodeKind, SceneGraph};

/// Pointer position in normalized device coordinates, `[-1, 1]` on both axes
/// for pixels inside the viewport (+Y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample(pub Vec2);

impl PointerSample {
    /// Normalizes a pixel position (origin top-left, +Y down).
    ///
    /// Returns `None` for an empty viewport.
    pub fn from_pixels(pixel: Vec2, viewport: Vec2) -> Option<Self> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let x = (pixel.x / viewport.x) * 2.0 - 1.0;
        let y = -(pixel.y / viewport.y) * 2.0 + 1.0;
        Some(Self(Vec2::new(x, y)))
    }

    pub fn ndc(self) -> Vec2 {
        self.0
    }
}

/// A world-space ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// One intersected node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub node: NodeId,
    /// Distance from the ray origin.
    pub distance: f32,
    /// World-space intersection point.
    pub point: Vec3,
}

/// Ray picker that keeps its traversal and result buffers between calls.
#[derive(Debug, Default)]
pub struct Picker {
    hits: Vec<PickHit>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the scene under a pixel position.
    ///
    /// Hits are ordered nearest first; equal distances keep traversal order.
    pub fn pick(
        &mut self,
        pointer_pixel: Vec2,
        viewport: Vec2,
        camera: &Camera,
        scene: &SceneGraph,
        root: NodeId,
    ) -> &[PickHit] {
        self.hits.clear();
        let Some(sample) = PointerSample::from_pixels(pointer_pixel, viewport) else {
            return &self.hits;
        };
        let Some(ray) = camera.ray_through(sample.ndc()) else {
            return &self.hits;
        };
        self.pick_ray(ray, scene, root)
    }

    /// Intersects a world-space ray with every visible, pickable mesh below `root`.
    pub fn pick_ray(&mut self, ray: Ray, scene: &SceneGraph, root: NodeId) -> &[PickHit] {
        self.hits.clear();

        scene.traverse_visible(root, |id, node, world| {
            if !node.pickable {
                return;
            }
            let NodeKind::Mesh(mesh) = &node.kind else {
                return;
            };
            let inverse = world.inverse();
            if !inverse.is_finite() {
                return;
            }
            // The local direction stays unnormalized so `t` is a world distance.
            let local_origin = inverse.transform_point3(ray.origin);
            let local_dir = inverse.transform_vector3(ray.direction);
            if let Some(t) = mesh.geometry.ray_intersection(local_origin, local_dir) {
                self.hits.push(PickHit {
                    node: id,
                    distance: t,
                    point: ray.at(t),
                });
            }
        });

        // `sort_by` is stable, ties stay in traversal order
        self.hits
            .sort_by(|a, b| a.distance.total_cmp(&b.distance));
        &self.hits
    }

    /// Hits of the last pick.
    pub fn hits(&self) -> &[PickHit] {
        &self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::material::{Color, Material};
    use crate::scene::{Mesh, Node};
    use proptest::prelude::*;

    fn cube(size: f32) -> Node {
        Node::mesh(Mesh::new(
            Geometry::cuboid(Vec3::splat(size)),
            Material::phong(Color::WHITE),
        ))
    }

    fn front_camera() -> Camera {
        let mut camera = Camera::new(1.0);
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.target = Vec3::ZERO;
        camera
    }

    #[test]
    fn test_center_pixel_is_origin() {
        let s = PointerSample::from_pixels(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0))
            .unwrap();
        assert!(s.ndc().length() < 1e-6);
    }

    #[test]
    fn test_y_is_flipped() {
        let top_left = PointerSample::from_pixels(Vec2::ZERO, Vec2::new(800.0, 600.0)).unwrap();
        assert_eq!(top_left.ndc(), Vec2::new(-1.0, 1.0));
        let bottom_right =
            PointerSample::from_pixels(Vec2::new(800.0, 600.0), Vec2::new(800.0, 600.0)).unwrap();
        assert_eq!(bottom_right.ndc(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_empty_viewport_has_no_sample() {
        assert!(PointerSample::from_pixels(Vec2::ZERO, Vec2::new(0.0, 600.0)).is_none());
    }

    proptest! {
        #[test]
        fn prop_pixels_inside_viewport_map_into_unit_square(
            w in 1.0f32..4096.0,
            h in 1.0f32..4096.0,
            fx in 0.0f32..=1.0,
            fy in 0.0f32..=1.0,
        ) {
            let s = PointerSample::from_pixels(Vec2::new(fx * w, fy * h), Vec2::new(w, h)).unwrap();
            prop_assert!(s.ndc().x >= -1.0 - 1e-5 && s.ndc().x <= 1.0 + 1e-5);
            prop_assert!(s.ndc().y >= -1.0 - 1e-5 && s.ndc().y <= 1.0 + 1e-5);
        }
    }

    #[test]
    fn test_empty_scene_no_hits() {
        let scene = SceneGraph::new();
        let mut picker = Picker::new();
        let hits = picker.pick(
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 100.0),
            &front_camera(),
            &scene,
            scene.root(),
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_hits_sorted_nearest_first() {
        let mut scene = SceneGraph::new();
        let far = scene.add_to_root(cube(1.0).with_position(Vec3::new(0.0, 0.0, -3.0)));
        let near = scene.add_to_root(cube(1.0).with_position(Vec3::new(0.0, 0.0, 2.0)));

        let mut picker = Picker::new();
        let hits = picker.pick(
            Vec2::new(50.0, 50.0),
            Vec2::new(100.0, 100.0),
            &front_camera(),
            &scene,
            scene.root(),
        );
        let ids: Vec<NodeId> = hits.iter().map(|h| h.node).collect();
        assert_eq!(ids, vec![near, far]);
        assert!(hits[0].distance < hits[1].distance);
        assert!((hits[0].point.z - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_nested_transforms_are_applied() {
        let mut scene = SceneGraph::new();
        let group = scene.add_to_root(Node::group().with_position(Vec3::new(5.0, 0.0, 0.0)));
        let child = scene.add(group, cube(1.0)).unwrap();

        let mut picker = Picker::new();
        let straight = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert!(picker.pick_ray(straight, &scene, scene.root()).is_empty());

        let shifted = Ray {
            origin: Vec3::new(5.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        let hits = picker.pick_ray(shifted, &scene, scene.root());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, child);
    }

    #[test]
    fn test_scaled_mesh_reports_world_distance() {
        let mut scene = SceneGraph::new();
        let node = cube(1.0).with_transform(glam::Mat4::from_scale(Vec3::splat(4.0)));
        scene.add_to_root(node);

        let mut picker = Picker::new();
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        let hits = picker.pick_ray(ray, &scene, scene.root());
        assert!((hits[0].distance - 8.0).abs() < 1e-3);
    }

    #[test]
    fn test_equal_distance_keeps_traversal_order() {
        let mut scene = SceneGraph::new();
        let first = scene.add_to_root(cube(1.0));
        let second = scene.add_to_root(cube(1.0));

        let mut picker = Picker::new();
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        let hits = picker.pick_ray(ray, &scene, scene.root());
        assert_eq!(hits[0].node, first);
        assert_eq!(hits[1].node, second);
    }

    #[test]
    fn test_non_pickable_and_hidden_skipped() {
        let mut scene = SceneGraph::new();
        scene.add_to_root(cube(1.0).with_pickable(false));
        let hidden = scene.add_to_root(cube(1.0));
        scene.get_mut(hidden).unwrap().visible = false;

        let mut picker = Picker::new();
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert!(picker.pick_ray(ray, &scene, scene.root()).is_empty());
    }
}
