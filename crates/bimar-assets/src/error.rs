//! Error types for asset loading.

use thiserror::Error;

/// Errors produced while fetching or decoding an asset.
///
/// Loads are shared between all requesters of a URL, so the error is `Clone` and
/// carries its causes as text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Nothing exists at the URL.
    #[error("asset not found: {url}")]
    NotFound { url: String },

    /// Reading the asset failed.
    #[error("failed to read {url}: {message}")]
    Io { url: String, message: String },

    /// The bytes could not be decoded into the requested asset type.
    #[error("failed to decode {url}: {message}")]
    Decode { url: String, message: String },

    /// The load was abandoned before completing.
    #[error("load of {url} was cancelled")]
    Cancelled { url: String },
}

impl AssetError {
    pub fn decode(url: &str, message: impl ToString) -> Self {
        Self::Decode {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(url: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                url: url.to_string(),
            }
        } else {
            Self::Io {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// A specialized Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;
