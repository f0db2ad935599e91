//! Rendering backend for bimar.
//!
//! This crate provides the wgpu forward renderer used by the viewer:
//! - per-frame draw lists built from a [`SceneGraph`]
//! - GPU mesh buffers cached by geometry id
//! - opaque and alpha-blended scene pipelines (WGSL)
//! - headless rendering and frame capture

// Index counts and byte offsets fit in u32 for any mesh we upload.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::new_without_default)]

pub mod draw_list;
pub mod engine;
pub mod error;
pub mod gpu_mesh;
pub mod pipeline;
pub mod screenshot;
pub mod uniforms;

use bimar_core::{Camera, Color, SceneGraph};

pub use draw_list::{DrawCall, DrawList};
pub use engine::RenderEngine;
pub use error::{RenderError, RenderResult};
pub use gpu_mesh::{GpuMeshCache, MeshVertex};
pub use pipeline::{ScenePipelines, DEPTH_FORMAT};
pub use screenshot::{encode_png, save_image, ScreenshotError};
pub use uniforms::{CameraUniforms, DrawUniforms, LightUniforms};

/// Anything that can draw a scene from a camera once per frame.
///
/// The interaction loop renders through this trait so it can run against the
/// GPU engine or a recording stand-in.
pub trait SceneRenderer {
    /// Draws one frame.
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) -> RenderResult<()>;

    /// Follows a viewport size change.
    fn resize(&mut self, width: u32, height: u32);

    /// Sets the clear color.
    fn set_background(&mut self, color: Color);
}
