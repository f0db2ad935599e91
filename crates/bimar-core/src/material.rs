//! Materials and colors for scene meshes.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub Vec3);

impl Color {
    pub const BLACK: Self = Self(Vec3::ZERO);
    pub const WHITE: Self = Self(Vec3::ONE);

    /// Creates a color from a 24-bit `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xff) as f32 / 255.0;
        let g = ((hex >> 8) & 0xff) as f32 / 255.0;
        let b = (hex & 0xff) as f32 / 255.0;
        Self(Vec3::new(r, g, b))
    }

    /// Returns the color packed as `0xRRGGBB`.
    pub fn to_hex(self) -> u32 {
        let c = (self.0.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        ((c.x as u32) << 16) | ((c.y as u32) << 8) | c.z as u32
    }

    /// Picks a uniformly random 24-bit color.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_hex(rng.gen_range(0..=0x00ff_ffff))
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Lighting model used when shading a material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shading {
    /// Blinn-Phong with a specular exponent.
    Phong { shininess: f32 },
    /// Diffuse-only shading.
    Standard,
}

impl Default for Shading {
    fn default() -> Self {
        Self::Phong { shininess: 30.0 }
    }
}

/// Surface appearance of a mesh (or of one material group of a mesh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: Color,
    /// Opacity in `[0, 1]`, only honored when `transparent` is set.
    pub opacity: f32,
    pub transparent: bool,
    pub shading: Shading,
}

impl Material {
    /// Creates an opaque Phong material.
    pub fn phong(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            transparent: false,
            shading: Shading::default(),
        }
    }

    /// Creates a transparent standard material.
    pub fn transparent_standard(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
            shading: Shading::Standard,
        }
    }

    /// Effective alpha used for rendering.
    pub fn alpha(&self) -> f32 {
        if self.transparent {
            self.opacity
        } else {
            1.0
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::phong(Color::WHITE)
    }
}

/// The materials of a mesh: one material, or one per geometry group.
#[derive(Debug, Clone, PartialEq)]
pub enum Materials {
    Single(Material),
    List(Vec<Material>),
}

impl Materials {
    /// Creates a material list.
    ///
    /// Lists are never empty; an empty input is rejected.
    pub fn list(materials: Vec<Material>) -> Result<Self> {
        if materials.is_empty() {
            return Err(CoreError::EmptyMaterialList);
        }
        Ok(Self::List(materials))
    }

    /// Number of materials.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::List(list) => list.len(),
        }
    }

    /// Always false: a single material counts as one and lists are non-empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Material used for the given geometry group.
    ///
    /// A single material applies to every group; out-of-range list indices fall back
    /// to the last entry.
    pub fn for_group(&self, material_index: usize) -> Option<&Material> {
        match self {
            Self::Single(material) => Some(material),
            Self::List(list) => list.get(material_index).or_else(|| list.last()),
        }
    }

    /// Iterates the materials in order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        let slice: &[Material] = match self {
            Self::Single(material) => std::slice::from_ref(material),
            Self::List(list) => list,
        };
        slice.iter()
    }

    /// Applies `f` to every material in order.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Material)) {
        match self {
            Self::Single(material) => f(material),
            Self::List(list) => list.iter_mut().for_each(f),
        }
    }

    /// Gives every material its own color drawn from `next_color`.
    pub fn recolor(&mut self, mut next_color: impl FnMut() -> Color) {
        self.for_each_mut(|material| material.color = next_color());
    }

    /// Any material needs alpha blending.
    pub fn is_transparent(&self) -> bool {
        self.iter().any(|m| m.transparent)
    }
}

impl From<Material> for Materials {
    fn from(material: Material) -> Self {
        Self::Single(material)
    }
}
