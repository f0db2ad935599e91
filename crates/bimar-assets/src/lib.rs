//! Asset loading for bimar.
//!
//! This crate provides:
//! - [`AssetSource`] byte sources ([`FileSource`] on disk, [`MemorySource`] in memory)
//! - [`AssetCache`] memoizing one shared load per URL
//! - Fonts and extruded text geometry ([`TextFont`], [`build_text_geometry`])
//! - BIM element manifests ([`ElementManifest`])
//! - Marker images for image tracking ([`MarkerImage`])
//! - Model post-processing ([`make_transparent`], [`axes_helper`])

// Geometry code intentionally uses casts for indices and pixel coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod cache;
pub mod error;
pub mod font;
pub mod manifest;
pub mod marker;
pub mod model;
pub mod source;

pub use cache::{AssetCache, SharedLoad};
pub use error::{AssetError, Result};
pub use font::{build_text_geometry, GlyphBitmap, GlyphSource, TextFont, TextParams};
pub use manifest::{ElementManifest, ElementSpec, ShapeSpec};
pub use marker::MarkerImage;
pub use model::{axes_helper, make_transparent};
pub use source::{AssetSource, FileSource, MemorySource};
