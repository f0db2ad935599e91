//! Rendering error types.

use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface reported no usable texture format.
    #[error("surface configuration failed")]
    SurfaceConfigurationFailed,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Frame capture is only available on headless engines.
    #[error("no offscreen target to capture")]
    NoOffscreenTarget,

    /// Reading back or saving a captured frame failed.
    #[error("frame capture failed: {0}")]
    Capture(#[from] ScreenshotError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
