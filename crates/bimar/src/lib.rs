//! bimar: a marker-anchored BIM viewer.
//!
//! A building model is loaded from an element manifest, anchored to a printed
//! marker through image tracking, and inspected by clicking: the nearest element
//! under the pointer is recolored and labeled with its name and description for
//! two seconds.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::rc::Rc;
//! use bimar::*;
//!
//! fn main() -> Result<()> {
//!     let options = Options::default();
//!     let source = Rc::new(FileSource::new("."));
//!     run(&options, source, None)
//! }
//! ```
//!
//! # Architecture
//!
//! The [`InteractionLoop`] owns the scene and runs once per displayed frame:
//!
//! 1. orbit controls (outside immersive sessions)
//! 2. marker pose tracking ([`PoseTracker`])
//! 3. input sampling ([`InputSampler`])
//! 4. picking and labeling on click ([`Picker`], [`AnnotationManager`])
//! 5. deferred work: startup loads and annotation timers
//! 6. rendering through a [`SceneRenderer`]

// Viewport sizes and frame times are converted between integer and float freely
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod annotation;
mod app;
pub mod error;
pub mod headless;
pub mod interaction;
pub mod setup;
pub mod xr;

pub use annotation::{
    Annotation, AnnotationManager, AnnotationReceipt, AnnotationRequest, LabelFont,
    RemovalScheduler,
};
pub use app::{run, App};
pub use error::{BimarError, Result};
pub use headless::{render_to_file, render_to_image};
pub use interaction::{FrameReport, InteractionLoop};
pub use setup::{build_scene, configure_camera, StartupLoads};
pub use xr::{ScriptedFrame, ScriptedResult, ScriptedSession};

// Re-export the building blocks
pub use bimar_assets::{AssetError, AssetSource, FileSource, GlyphSource, MemorySource};
pub use bimar_core::{
    Camera, Color, ElementMetadata, InputEvent, InputSampler, Mat4, Material, Materials, NodeId,
    Options, Picker, PointerButton, PoseTracker, SceneGraph, Vec2, Vec3, XrFrame, XrSession,
};
pub use bimar_render::{RenderEngine, SceneRenderer};

/// Initializes logging from `RUST_LOG`. Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::try_init();
}
