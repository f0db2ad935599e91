//! Headless rendering: draw one frame of a viewer without opening a window.
//!
//! Useful for integration tests, batch screenshots and checking a tracking
//! script against a model.

use std::path::Path;

use pollster::FutureExt;

use bimar_core::XrFrame;
use bimar_render::{RenderEngine, SceneRenderer};

use crate::error::Result;
use crate::interaction::InteractionLoop;

/// Renders one frame of `viewer` to a raw RGBA pixel buffer.
///
/// Startup loads are driven to completion first, so the model is in the frame.
/// The returned buffer has `width * height * 4` bytes, rows top to bottom.
pub fn render_to_image(
    viewer: &mut InteractionLoop,
    width: u32,
    height: u32,
    time_ms: f64,
    frame: Option<&dyn XrFrame>,
) -> Result<Vec<u8>> {
    let mut engine = RenderEngine::new_headless(width, height).block_on()?;
    engine.set_background(viewer.background());
    viewer.complete_startup();
    viewer.resize(width, height, &mut engine);
    viewer.frame(time_ms, frame, &mut engine)?;
    Ok(engine.capture()?)
}

/// Renders one frame of `viewer` and saves it as PNG or JPEG.
pub fn render_to_file(
    viewer: &mut InteractionLoop,
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    frame: Option<&dyn XrFrame>,
) -> Result<()> {
    let pixels = render_to_image(viewer, width, height, 0.0, frame)?;
    bimar_render::save_image(path, &pixels, width, height)
        .map_err(bimar_render::RenderError::from)?;
    Ok(())
}
