//! Fonts and extruded 3D text geometry.
//!
//! Glyphs are rasterized to coverage bitmaps and every covered pixel becomes a
//! small prism. Horizontal runs of covered pixels share one front and one back
//! quad; side walls are emitted only where a covered pixel borders an empty one.
//! The result has two material groups: caps (front and back) first, sides second.

use bimar_core::{Geometry, GeometryGroup, Vec3};
use fontdue::{Font, FontSettings};

use crate::error::{AssetError, Result};

/// Material slot of the front and back faces of extruded text.
pub const CAP_MATERIAL: usize = 0;
/// Material slot of the extruded side walls.
pub const SIDE_MATERIAL: usize = 1;

/// A rasterized glyph. Coverage rows run top to bottom.
#[derive(Debug, Clone, Default)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
    /// Left edge of the bitmap relative to the pen position, in pixels.
    pub xmin: i32,
    /// Bottom edge of the bitmap relative to the baseline, in pixels.
    pub ymin: i32,
    /// Horizontal pen advance, in pixels.
    pub advance: f32,
}

impl GlyphBitmap {
    fn covered(&self, x: i64, y: i64, threshold: u8) -> bool {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return false;
        }
        self.coverage
            .get(y as usize * self.width + x as usize)
            .is_some_and(|c| *c >= threshold)
    }
}

/// Anything that can rasterize characters.
pub trait GlyphSource {
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap;
}

/// A TrueType/OpenType font loaded with fontdue.
pub struct TextFont {
    font: Font,
}

impl TextFont {
    pub fn from_bytes(url: &str, bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| AssetError::decode(url, e))?;
        Ok(Self { font })
    }

    pub fn name(&self) -> Option<&str> {
        self.font.name()
    }
}

impl std::fmt::Debug for TextFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextFont")
            .field("name", &self.font.name())
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl GlyphSource for TextFont {
    fn rasterize(&self, ch: char, px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            coverage,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
        }
    }
}

/// Text geometry parameters.
#[derive(Debug, Clone, Copy)]
pub struct TextParams {
    /// Glyph size in world units (one em).
    pub size: f32,
    /// Extrusion depth in world units.
    pub depth: f32,
    /// Rasterization size in pixels; higher is smoother and heavier.
    pub raster_px: f32,
    /// Minimum coverage for a pixel to be solid.
    pub threshold: u8,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            size: 20.0,
            depth: 2.0,
            raster_px: 24.0,
            threshold: 128,
        }
    }
}

#[derive(Default)]
struct MeshBuffers {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    /// Adds a planar quad facing `normal`; corners go around the quad.
    fn quad(&mut self, corners: [Vec3; 4], normal: Vec3) {
        let base = self.positions.len() as u32;
        let winding = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
        self.positions.extend(corners);
        self.normals.extend([normal; 4]);
        if winding.dot(normal) >= 0.0 {
            self.indices
                .extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            self.indices
                .extend([base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }
}

/// Builds extruded text with its baseline on `y = 0`, starting at `x = 0`, spanning
/// `z` from 0 to `params.depth`.
pub fn build_text_geometry(text: &str, glyphs: &dyn GlyphSource, params: &TextParams) -> Geometry {
    let scale = params.size / params.raster_px;
    let depth = params.depth;
    let mut caps = MeshBuffers::default();
    let mut sides = MeshBuffers::default();
    let mut pen = 0.0f32;

    for ch in text.chars() {
        let glyph = glyphs.rasterize(ch, params.raster_px);
        let origin_x = pen + glyph.xmin as f32;
        let origin_y = glyph.ymin as f32;
        let t = params.threshold;

        for row in 0..glyph.height as i64 {
            // Bottom of this pixel row above the baseline.
            let y0 = (origin_y + (glyph.height as i64 - 1 - row) as f32) * scale;
            let y1 = y0 + scale;

            let mut col = 0i64;
            while col < glyph.width as i64 {
                if !glyph.covered(col, row, t) {
                    col += 1;
                    continue;
                }
                let run_start = col;
                while glyph.covered(col, row, t) {
                    col += 1;
                }
                let x0 = (origin_x + run_start as f32) * scale;
                let x1 = (origin_x + col as f32) * scale;

                caps.quad(
                    [
                        Vec3::new(x0, y0, depth),
                        Vec3::new(x1, y0, depth),
                        Vec3::new(x1, y1, depth),
                        Vec3::new(x0, y1, depth),
                    ],
                    Vec3::Z,
                );
                caps.quad(
                    [
                        Vec3::new(x0, y0, 0.0),
                        Vec3::new(x0, y1, 0.0),
                        Vec3::new(x1, y1, 0.0),
                        Vec3::new(x1, y0, 0.0),
                    ],
                    Vec3::NEG_Z,
                );

                sides.quad(
                    [
                        Vec3::new(x0, y0, 0.0),
                        Vec3::new(x0, y0, depth),
                        Vec3::new(x0, y1, depth),
                        Vec3::new(x0, y1, 0.0),
                    ],
                    Vec3::NEG_X,
                );
                sides.quad(
                    [
                        Vec3::new(x1, y0, 0.0),
                        Vec3::new(x1, y1, 0.0),
                        Vec3::new(x1, y1, depth),
                        Vec3::new(x1, y0, depth),
                    ],
                    Vec3::X,
                );

                for c in run_start..col {
                    let px0 = (origin_x + c as f32) * scale;
                    let px1 = px0 + scale;
                    if !glyph.covered(c, row - 1, t) {
                        sides.quad(
                            [
                                Vec3::new(px0, y1, 0.0),
                                Vec3::new(px0, y1, depth),
                                Vec3::new(px1, y1, depth),
                                Vec3::new(px1, y1, 0.0),
                            ],
                            Vec3::Y,
                        );
                    }
                    if !glyph.covered(c, row + 1, t) {
                        sides.quad(
                            [
                                Vec3::new(px0, y0, 0.0),
                                Vec3::new(px1, y0, 0.0),
                                Vec3::new(px1, y0, depth),
                                Vec3::new(px0, y0, depth),
                            ],
                            Vec3::NEG_Y,
                        );
                    }
                }
            }
        }

        pen += glyph.advance;
    }

    merge_groups(caps, sides)
}

fn merge_groups(caps: MeshBuffers, sides: MeshBuffers) -> Geometry {
    let cap_count = caps.indices.len() as u32;
    let side_count = sides.indices.len() as u32;
    let offset = caps.positions.len() as u32;

    let mut positions = caps.positions;
    let mut normals = caps.normals;
    let mut indices = caps.indices;
    positions.extend(sides.positions);
    normals.extend(sides.normals);
    indices.extend(sides.indices.into_iter().map(|i| i + offset));

    let mut groups = Vec::with_capacity(2);
    if cap_count > 0 {
        groups.push(GeometryGroup {
            start: 0,
            count: cap_count,
            material_index: CAP_MATERIAL,
        });
    }
    if side_count > 0 {
        groups.push(GeometryGroup {
            start: cap_count,
            count: side_count,
            material_index: SIDE_MATERIAL,
        });
    }
    Geometry::new(positions, normals, indices, groups)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Every non-space character is a solid `cells x cells` block.
    pub(crate) struct BlockGlyphs {
        pub cells: usize,
    }

    impl GlyphSource for BlockGlyphs {
        fn rasterize(&self, ch: char, _px: f32) -> GlyphBitmap {
            let n = self.cells;
            if ch == ' ' {
                return GlyphBitmap {
                    advance: n as f32 + 1.0,
                    ..GlyphBitmap::default()
                };
            }
            GlyphBitmap {
                width: n,
                height: n,
                coverage: vec![255; n * n],
                xmin: 0,
                ymin: 0,
                advance: n as f32 + 1.0,
            }
        }
    }

    fn params() -> TextParams {
        TextParams {
            size: 4.0,
            depth: 2.0,
            raster_px: 4.0,
            threshold: 128,
        }
    }

    #[test]
    fn test_single_block_is_a_box() {
        let geometry = build_text_geometry("A", &BlockGlyphs { cells: 2 }, &params());
        let bounds = geometry.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::new(2.0, 2.0, 2.0));

        let groups = geometry.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].material_index, CAP_MATERIAL);
        assert_eq!(groups[1].material_index, SIDE_MATERIAL);
        // Two rows, each with a front and back quad.
        assert_eq!(groups[0].count, 2 * 2 * 6);
        // Left + right per row, top of the upper row, bottom of the lower row, per pixel.
        assert_eq!(groups[1].count, (2 * 2 + 2 + 2) * 6);
        assert_eq!(groups[1].start, groups[0].count);
    }

    #[test]
    fn test_faces_wound_along_normals() {
        let geometry = build_text_geometry("Hi", &BlockGlyphs { cells: 3 }, &params());
        let positions = geometry.positions();
        for tri in geometry.indices().chunks_exact(3) {
            let [a, b, c] = [
                positions[tri[0] as usize],
                positions[tri[1] as usize],
                positions[tri[2] as usize],
            ];
            let normal = geometry.normals()[tri[0] as usize];
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_pen_advances_between_glyphs() {
        let geometry = build_text_geometry("A B", &BlockGlyphs { cells: 2 }, &params());
        let bounds = geometry.bounds().unwrap();
        // Two advances of 3 pixels, then a glyph 2 wide.
        assert!((bounds.max.x - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_blank_text_is_empty() {
        let geometry = build_text_geometry("  ", &BlockGlyphs { cells: 2 }, &params());
        assert!(geometry.positions().is_empty());
        assert!(geometry.groups().is_empty());
    }

    #[test]
    fn test_invalid_font_bytes() {
        let err = TextFont::from_bytes("font.ttf", b"not a font").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }
}
