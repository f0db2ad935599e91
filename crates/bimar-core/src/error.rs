//! Error types for bimar-core.

use thiserror::Error;

/// The main error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A material list must hold at least one material.
    #[error("material list must not be empty")]
    EmptyMaterialList,

    /// A tracked pose carried a matrix of the wrong length.
    #[error("malformed pose for image {image_index}: expected 16 matrix elements, got {len}")]
    MalformedPose { image_index: u32, len: usize },

    /// A result was reported as tracked but the frame had no pose for it.
    #[error("no pose available for tracked image {image_index}")]
    MissingPose { image_index: u32 },

    /// The node does not exist (never inserted or already removed).
    #[error("scene node not found")]
    NodeNotFound,

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
