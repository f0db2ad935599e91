//! Shared fixtures for the viewer integration tests.
#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Arc;

use bimar::annotation::LabelFont;
use bimar::*;
use bimar_assets::GlyphBitmap;
use bimar_core::{Geometry, Mesh, Node};
use bimar_render::RenderResult;

pub const FONT_URL: &str = "fonts/label.ttf";

/// Every printable character is a solid 2x3 pixel block.
pub struct BlockFont;

impl GlyphSource for BlockFont {
    fn rasterize(&self, ch: char, _px: f32) -> GlyphBitmap {
        if ch.is_whitespace() {
            return GlyphBitmap {
                advance: 3.0,
                ..GlyphBitmap::default()
            };
        }
        GlyphBitmap {
            width: 2,
            height: 3,
            coverage: vec![255; 6],
            xmin: 0,
            ymin: 0,
            advance: 3.0,
        }
    }
}

/// Stands in for the GPU: counts frames and remembers what was drawn.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: usize,
    pub last_node_count: usize,
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, scene: &SceneGraph, _camera: &Camera) -> RenderResult<()> {
        self.frames += 1;
        self.last_node_count = scene.len();
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn set_background(&mut self, _color: Color) {}
}

/// Options without startup loads or helpers, so the scene holds only what a
/// test adds.
pub fn bare_options() -> Options {
    let mut options = Options::default();
    options.model.manifest = String::new();
    options.marker.image = String::new();
    options.axes_size = 0.0;
    options.annotation.font = FONT_URL.to_string();
    options
}

/// A viewer looking at the origin from +Z with the block font available.
pub fn viewer(source: &MemorySource) -> InteractionLoop {
    source.insert(FONT_URL, vec![0u8]);
    viewer_without_font(source)
}

/// Like [`viewer`], but the font is only what `source` provides.
pub fn viewer_without_font(source: &MemorySource) -> InteractionLoop {
    let options = bare_options();
    let dyn_source: Rc<dyn AssetSource> = Rc::new(source.clone());
    let annotations = AnnotationManager::with_font_decoder(
        Rc::clone(&dyn_source),
        options.annotation.clone(),
        |_, _| Ok(Box::new(BlockFont) as LabelFont),
    );
    let mut viewer =
        InteractionLoop::with_annotations(&options, dyn_source, annotations).with_seed(42);
    viewer.camera.position = Vec3::new(0.0, 0.0, 10.0);
    viewer.camera.target = Vec3::ZERO;
    viewer
}

/// Adds a 2x2x2 box at the origin under the model group.
pub fn add_element(viewer: &mut InteractionLoop, metadata: ElementMetadata, materials: Materials) -> NodeId {
    let node = Node::mesh(Mesh::new(Arc::new(Geometry::cuboid(Vec3::splat(2.0))), materials))
        .with_metadata(metadata);
    let model_root = viewer.model_root();
    viewer.scene.add(model_root, node).unwrap()
}

/// Queues a primary click at the center of the 1280x720 viewport.
pub fn click_center(viewer: &mut InteractionLoop) {
    click_at(viewer, Vec2::new(640.0, 360.0));
}

pub fn click_at(viewer: &mut InteractionLoop, position: Vec2) {
    viewer.input.push(InputEvent::PointerMoved { position });
    viewer.input.push(InputEvent::PointerButton {
        button: PointerButton::Primary,
        pressed: true,
    });
    viewer.input.push(InputEvent::PointerButton {
        button: PointerButton::Primary,
        pressed: false,
    });
}
