//! Marker images for image tracking.

use image::RgbaImage;

use crate::error::{AssetError, Result};

/// A decoded marker bitmap and the physical width of its printed copy.
#[derive(Debug, Clone)]
pub struct MarkerImage {
    pub image: RgbaImage,
    pub width_meters: f32,
}

impl MarkerImage {
    /// Decodes any format supported by `image` into RGBA8.
    pub fn decode(url: &str, bytes: &[u8], width_meters: f32) -> Result<Self> {
        if !(width_meters.is_finite() && width_meters > 0.0) {
            return Err(AssetError::decode(
                url,
                format!("marker width must be positive, got {width_meters}"),
            ));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| AssetError::decode(url, e))?
            .to_rgba8();
        Ok(Self {
            image,
            width_meters,
        })
    }

    /// Physical height implied by the aspect ratio of the bitmap.
    pub fn height_meters(&self) -> f32 {
        if self.image.width() == 0 {
            return 0.0;
        }
        self.width_meters * self.image.height() as f32 / self.image.width() as f32
    }
}
