//! Core abstractions for bimar.
//!
//! This crate provides the engine-independent pieces of the viewer:
//! - [`SceneGraph`] with generational [`NodeId`]s, meshes, lights and BIM metadata
//! - [`Materials`] as a single material or an ordered list with uniform iteration
//! - [`Camera`] and [`OrbitControls`] for the non-immersive view
//! - [`InputSampler`] with edge-triggered queries
//! - [`PoseTracker`] for marker-anchored transforms
//! - [`Picker`] for ray picking against the scene
//! - [`TimerQueue`] for cancellable deferred work
//! - [`Options`] for viewer configuration

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Pixel and index math converts between float and integer types throughout
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod camera;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod input;
pub mod material;
pub mod options;
pub mod pick;
pub mod scene;
pub mod timer;
pub mod tracking;

pub use camera::Camera;
pub use controls::OrbitControls;
pub use error::{CoreError, Result};
pub use geometry::{Aabb, Geometry, GeometryGroup, GeometryId};
pub use input::{InputEvent, InputSampler, PointerButton};
pub use material::{Color, Material, Materials, Shading};
pub use options::{AnnotationOptions, CameraOptions, MarkerOptions, ModelOptions, Options, TrackingOptions};
pub use pick::{PickHit, Picker, PointerSample, Ray};
pub use scene::{ElementMetadata, Light, Mesh, Node, NodeId, NodeKind, SceneGraph};
pub use timer::{TimerHandle, TimerQueue};
pub use tracking::{
    count_trackable_images, ImageTrackingScore, PoseTracker, RawPose, ReferenceSpace, TieBreak,
    TrackingResult, TrackingState, XrFrame, XrSession,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
