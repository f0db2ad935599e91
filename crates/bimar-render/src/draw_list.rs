//! CPU side of a frame: which geometry ranges to draw with which uniforms.

use std::ops::Range;
use std::sync::Arc;

use bimar_core::{Camera, Geometry, GeometryId, Light, NodeKind, SceneGraph, Vec3};

use crate::uniforms::{DrawUniforms, LightUniforms, MAX_DIRECTIONAL_LIGHTS};

/// One indexed draw.
#[derive(Debug, Clone)]
pub struct DrawCall {
    pub geometry: GeometryId,
    pub indices: Range<u32>,
    pub uniforms: DrawUniforms,
    /// Squared distance from the camera to the mesh origin, for blending order.
    pub depth: f32,
}

/// Everything the GPU needs for one frame of the scene.
#[derive(Debug, Default)]
pub struct DrawList {
    /// Geometries referenced by this frame, without duplicates.
    pub geometries: Vec<Arc<Geometry>>,
    /// Opaque draws in traversal order.
    pub opaque: Vec<DrawCall>,
    /// Blended draws, farthest first.
    pub transparent: Vec<DrawCall>,
    pub lights: LightUniforms,
}

impl DrawList {
    /// Walks the visible scene and builds the frame's draws and lighting.
    pub fn collect(scene: &SceneGraph, camera: &Camera) -> Self {
        let mut list = Self::default();
        let mut ambient = Vec3::ZERO;
        let mut directional = 0usize;

        scene.traverse_visible(scene.root(), |_, node, world| match &node.kind {
            NodeKind::Group => {}
            NodeKind::Light(Light::Ambient { color, intensity }) => {
                ambient += color.0 * *intensity;
            }
            NodeKind::Light(Light::Directional { color, intensity }) => {
                if directional >= MAX_DIRECTIONAL_LIGHTS {
                    log::warn!("ignoring directional light beyond {MAX_DIRECTIONAL_LIGHTS}");
                    return;
                }
                let toward = world.w_axis.truncate().try_normalize().unwrap_or(Vec3::Y);
                list.lights.directions[directional] = toward.extend(0.0).to_array();
                list.lights.colors[directional] = (color.0 * *intensity).extend(1.0).to_array();
                directional += 1;
            }
            NodeKind::Mesh(mesh) => {
                let geometry = &mesh.geometry;
                if geometry.indices().is_empty() {
                    return;
                }
                if !list.geometries.iter().any(|g| g.id() == geometry.id()) {
                    list.geometries.push(Arc::clone(geometry));
                }
                let depth = world.w_axis.truncate().distance_squared(camera.position);
                for group in geometry.groups() {
                    let Some(material) = mesh.materials.for_group(group.material_index) else {
                        continue;
                    };
                    let call = DrawCall {
                        geometry: geometry.id(),
                        indices: group.start..group.start + group.count,
                        uniforms: DrawUniforms::new(world, material),
                        depth,
                    };
                    if material.transparent {
                        list.transparent.push(call);
                    } else {
                        list.opaque.push(call);
                    }
                }
            }
        });

        list.lights.ambient = ambient.extend(1.0).to_array();
        list.lights.count[0] = directional as u32;
        list.transparent
            .sort_by(|a, b| b.depth.total_cmp(&a.depth));
        list
    }

    /// Total number of draws.
    pub fn len(&self) -> usize {
        self.opaque.len() + self.transparent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opaque draws followed by transparent ones, in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &DrawCall> {
        self.opaque.iter().chain(self.transparent.iter())
    }
}
