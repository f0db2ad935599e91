//! Configuration options for the viewer.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::material::Color;
use crate::tracking::{ReferenceSpace, TieBreak};

/// Viewer configuration. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Clear color, `0xRRGGBB`.
    pub background_color: u32,

    pub camera: CameraOptions,

    /// Ambient light color, `0xRRGGBB`.
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    /// Directional light position; it shines toward the origin.
    pub directional_position: Vec3,
    pub directional_intensity: f32,

    /// Size of the axes helper inside the model group (0 disables it).
    pub axes_size: f32,

    pub annotation: AnnotationOptions,
    pub model: ModelOptions,
    pub marker: MarkerOptions,
    pub tracking: TrackingOptions,

    /// Initial window size in logical pixels.
    pub window_size: [u32; 2],
}

impl Default for Options {
    fn default() -> Self {
        Self {
            background_color: 0x000000,
            camera: CameraOptions::default(),
            ambient_color: 0x777777,
            ambient_intensity: 1.0,
            directional_position: Vec3::new(1.0, 1.0, 0.0),
            directional_intensity: 1.0,
            axes_size: 1.0,
            annotation: AnnotationOptions::default(),
            model: ModelOptions::default(),
            marker: MarkerOptions::default(),
            tracking: TrackingOptions::default(),
            window_size: [1280, 720],
        }
    }
}

impl Options {
    /// Reads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn background(&self) -> Color {
        Color::from_hex(self.background_color)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 1.0e4,
            position: Vec3::new(0.0, 10.0, 0.0),
            // Straight down from (0, 10, 0) would leave the up vector undefined.
            target: Vec3::new(0.0, 0.0, -10.0),
        }
    }
}

/// Transient label appearance and placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationOptions {
    /// Font asset URL.
    pub font: String,
    /// Glyph height in world units.
    pub size: f32,
    /// Extrusion depth in world units.
    pub depth: f32,
    /// Time before a label is removed, in milliseconds.
    pub lifetime_ms: f64,
    /// Primary (name) label offset from the picked object.
    pub primary_offset: Vec3,
    /// Secondary (description) label offset from the picked object.
    pub secondary_offset: Vec3,
    pub face_color: u32,
    pub border_color: u32,
    /// Text used for missing metadata fields.
    pub missing_text: String,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            font: "assets/font.ttf".to_string(),
            size: 20.0,
            depth: 2.0,
            lifetime_ms: 2000.0,
            primary_offset: Vec3::new(-100.0, 160.0, 0.0),
            secondary_offset: Vec3::new(-100.0, 140.0, 0.0),
            face_color: 0xad4000,
            border_color: 0x5c2301,
            missing_text: "undefined".to_string(),
        }
    }
}

/// BIM model loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Element manifest URL; empty disables model loading.
    pub manifest: String,
    /// Translation baked into the loaded elements.
    pub offset: Vec3,
    pub transparent: bool,
    pub opacity: f32,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            manifest: "assets/model.json".to_string(),
            offset: Vec3::new(10.0, 0.0, 5.0),
            transparent: true,
            opacity: 0.8,
        }
    }
}

/// Marker image handed to the image-tracking session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    /// Image URL; empty disables marker loading.
    pub image: String,
    /// Physical width of the printed marker in meters.
    pub width_meters: f32,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            image: "assets/aruco.png".to_string(),
            width_meters: 0.19,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    pub tie_break: TieBreak,
    pub reference_space: ReferenceSpace,
}
