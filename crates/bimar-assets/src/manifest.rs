//! BIM element manifests: building elements described in JSON.
//!
//! ```json
//! {
//!   "elements": [
//!     { "name": "Wall-12", "description": "Load bearing",
//!       "shape": { "type": "box", "size": [4.0, 3.0, 0.2] },
//!       "position": [0.0, 1.5, 0.0], "colors": [13421772] }
//!   ]
//! }
//! ```

use std::sync::Arc;

use bimar_core::{
    Color, ElementMetadata, Geometry, GeometryGroup, Material, Materials, Mat4, Mesh, Node, Quat,
    Vec3,
};
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};

/// Geometry of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeSpec {
    /// Axis-aligned box centered on the element origin.
    Box { size: Vec3 },
    /// Raw triangle mesh.
    Mesh {
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        /// Material groups; when empty the whole mesh uses the first color.
        #[serde(default)]
        groups: Vec<GroupSpec>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub start: u32,
    pub count: u32,
    pub material: usize,
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

fn default_colors() -> Vec<u32> {
    vec![0xffffff]
}

/// One building element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub shape: ShapeSpec,
    #[serde(default)]
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    /// One `0xRRGGBB` color per material; several colors give a material list.
    #[serde(default = "default_colors")]
    pub colors: Vec<u32>,
}

/// A parsed manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementManifest {
    pub elements: Vec<ElementSpec>,
}

impl ElementManifest {
    pub fn parse(url: &str, bytes: &[u8]) -> Result<Self> {
        let manifest: Self =
            serde_json::from_slice(bytes).map_err(|e| AssetError::decode(url, e))?;
        for (i, element) in manifest.elements.iter().enumerate() {
            element
                .validate()
                .map_err(|message| AssetError::decode(url, format!("element {i}: {message}")))?;
        }
        Ok(manifest)
    }

    /// Builds one scene node per element, shifted by `offset`.
    pub fn instantiate(&self, offset: Vec3) -> Vec<Node> {
        self.elements
            .iter()
            .map(|element| element.to_node(offset))
            .collect()
    }
}

impl ElementSpec {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.colors.is_empty() {
            return Err("at least one color is required".to_string());
        }
        if let ShapeSpec::Mesh {
            positions,
            indices,
            groups,
        } = &self.shape
        {
            if indices.len() % 3 != 0 {
                return Err(format!("{} indices do not form triangles", indices.len()));
            }
            if let Some(bad) = indices.iter().find(|i| **i as usize >= positions.len()) {
                return Err(format!(
                    "index {bad} out of range for {} positions",
                    positions.len()
                ));
            }
            for group in groups {
                let end = u64::from(group.start) + u64::from(group.count);
                if end > indices.len() as u64 {
                    return Err(format!("group {}..{end} exceeds the index list", group.start));
                }
            }
        }
        Ok(())
    }

    fn geometry(&self) -> Geometry {
        match &self.shape {
            ShapeSpec::Box { size } => Geometry::cuboid(*size),
            ShapeSpec::Mesh {
                positions,
                indices,
                groups,
            } => {
                let base = Geometry::from_triangles(positions.clone(), indices.clone());
                if groups.is_empty() {
                    return base;
                }
                let groups = groups
                    .iter()
                    .map(|g| GeometryGroup {
                        start: g.start,
                        count: g.count,
                        material_index: g.material,
                    })
                    .collect();
                Geometry::new(
                    base.positions().to_vec(),
                    base.normals().to_vec(),
                    base.indices().to_vec(),
                    groups,
                )
            }
        }
    }

    fn materials(&self) -> Materials {
        let mut materials: Vec<Material> = self
            .colors
            .iter()
            .map(|hex| Material::phong(Color::from_hex(*hex)))
            .collect();
        if materials.len() == 1 {
            Materials::Single(materials.remove(0))
        } else {
            Materials::List(materials)
        }
    }

    fn to_node(&self, offset: Vec3) -> Node {
        let rotation = Quat::from_euler(
            glam::EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        let transform =
            Mat4::from_scale_rotation_translation(self.scale, rotation, self.position + offset);
        let metadata = ElementMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
        };
        Node::mesh(Mesh::new(Arc::new(self.geometry()), self.materials()))
            .with_transform(transform)
            .with_metadata(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "elements": [
            { "name": "Wall-12", "shape": { "type": "box", "size": [4.0, 3.0, 0.2] },
              "position": [0.0, 1.5, 0.0] },
            { "name": "Slab-1", "description": "Ground floor slab",
              "shape": { "type": "mesh",
                         "positions": [[0,0,0],[1,0,0],[0,0,1],[1,0,1]],
                         "indices": [0,2,1, 1,2,3],
                         "groups": [{ "start": 0, "count": 3, "material": 0 },
                                    { "start": 3, "count": 3, "material": 1 }] },
              "colors": [16711680, 255] }
        ]
    }"#;

    #[test]
    fn test_parse_and_instantiate() {
        let manifest = ElementManifest::parse("model.json", SAMPLE.as_bytes()).unwrap();
        assert_eq!(manifest.elements.len(), 2);

        let nodes = manifest.instantiate(Vec3::new(10.0, 0.0, 5.0));
        assert_eq!(nodes[0].metadata.name.as_deref(), Some("Wall-12"));
        assert_eq!(nodes[0].metadata.description, None);
        assert_eq!(nodes[0].position(), Vec3::new(10.0, 1.5, 5.0));

        let slab = nodes[1].as_mesh().unwrap();
        assert_eq!(slab.materials.len(), 2);
        assert_eq!(slab.geometry.groups().len(), 2);
        assert_eq!(slab.geometry.groups()[1].material_index, 1);
        assert!(matches!(nodes[0].as_mesh().unwrap().materials, Materials::Single(_)));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let json = r#"{ "elements": [ { "shape": { "type": "mesh",
            "positions": [[0,0,0],[1,0,0],[0,1,0]], "indices": [0,1,5] } } ] }"#;
        let err = ElementManifest::parse("bad.json", json.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn test_empty_colors_rejected() {
        let json = r#"{ "elements": [ { "shape": { "type": "box", "size": [1,1,1] }, "colors": [] } ] }"#;
        assert!(ElementManifest::parse("bad.json", json.as_bytes()).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(ElementManifest::parse("bad.json", b"{ elements: ").is_err());
    }
}
