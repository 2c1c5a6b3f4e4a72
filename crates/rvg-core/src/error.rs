//! Error types shared by the scene graph and its backends.

use thiserror::Error;

/// Errors raised by a raster backend.
///
/// The scene graph never constructs these itself except in the recording
/// backend; they travel through [`RvgError::Backend`] unchanged.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("Unknown color: {0}")]
    UnknownColor(String),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Undefined resource: {0}")]
    UndefinedResource(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Scene graph errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RvgError {
    /// Bad argument at build time. Only the offending call is aborted.
    #[error("Validation error: {0}")]
    Validation(String),
    /// A feature that is part of the interface but has no layout algorithm.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RvgError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        RvgError::Validation(msg.into())
    }

    /// Check whether this is a build-time validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, RvgError::Validation(_))
    }
}

/// Result type for scene graph operations.
pub type Result<T> = std::result::Result<T, RvgError>;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_propagates_unchanged() {
        let err: RvgError = BackendError::UnknownColor("blurple".into()).into();
        assert_eq!(err, RvgError::Backend(BackendError::UnknownColor("blurple".into())));
        assert_eq!(err.to_string(), "Unknown color: blurple");
    }

    #[test]
    fn test_is_validation() {
        assert!(RvgError::validation("bad").is_validation());
        assert!(!RvgError::Unsupported("rl".into()).is_validation());
    }
}
