//! Application error type.

use thiserror::Error;

use bimar_assets::AssetError;
use bimar_core::CoreError;
use bimar_render::RenderError;

/// Errors surfaced by the viewer.
#[derive(Error, Debug)]
pub enum BimarError {
    /// Scene, tracking or configuration error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An asset failed to load.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The window system failed.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// The window could not be created.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// Reading a file named on the command line failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A tracking script could not be parsed.
    #[error("invalid tracking script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A specialized Result type for viewer operations.
pub type Result<T> = std::result::Result<T, BimarError>;
