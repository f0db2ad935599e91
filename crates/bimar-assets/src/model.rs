//! Post-processing of loaded models and helper geometry.

use std::sync::Arc;

use bimar_core::{Color, Geometry, Material, Mesh, Node, NodeId, SceneGraph, Vec3};

/// Replaces every mesh material below `root` with a transparent standard material
/// of the same color. Works on single materials and material lists alike.
///
/// Returns the number of meshes changed.
pub fn make_transparent(scene: &mut SceneGraph, root: NodeId, opacity: f32) -> usize {
    let mut changed = 0;
    for id in scene.descendants(root) {
        let Some(mesh) = scene.get_mut(id).and_then(Node::as_mesh_mut) else {
            continue;
        };
        mesh.materials.for_each_mut(|material| {
            *material = Material::transparent_standard(material.color, opacity);
        });
        changed += 1;
    }
    changed
}

/// Three thin boxes along +X (red), +Y (green) and +Z (blue) starting at the origin.
///
/// The helper is not pickable.
pub fn axes_helper(size: f32) -> Vec<Node> {
    let thickness = (size * 0.02).max(1e-3);
    [
        (Vec3::X, 0xff0000),
        (Vec3::Y, 0x00ff00),
        (Vec3::Z, 0x0000ff),
    ]
    .into_iter()
    .map(|(axis, hex)| {
        let extent = Vec3::splat(thickness) + axis * (size - thickness);
        Node::mesh(Mesh::new(
            Arc::new(Geometry::cuboid(extent)),
            Material::phong(Color::from_hex(hex)),
        ))
        .with_position(axis * size * 0.5)
        .with_pickable(false)
    })
    .collect()
}
