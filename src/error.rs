//! Error types for mask editing and compositing operations

use thiserror::Error;

/// Result type alias for editing operations
pub type Result<T> = std::result::Result<T, RefineError>;

/// Which of the session inputs a load failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRole {
    /// The original photo, used as the restore source
    Original,
    /// The cutout produced by background removal
    Cutout,
    /// A background image chosen for export
    Background,
}

impl std::fmt::Display for SourceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Original => write!(f, "original"),
            Self::Cutout => write!(f, "cutout"),
            Self::Background => write!(f, "background"),
        }
    }
}

/// Error types for mask editing, compositing and remote cutout requests
#[derive(Error, Debug)]
pub enum RefineError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image codec errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A source raster could not be read or decoded
    #[error("Failed to load {role} image: {reason}")]
    Load {
        /// Which input failed
        role: SourceRole,
        /// Human readable cause
        reason: String,
    },

    /// The session has not finished loading its sources
    #[error("Editing session is not ready")]
    SessionNotReady,

    /// The session was already saved or cancelled
    #[error("Editing session is closed ({0})")]
    SessionClosed(String),

    /// Remote service or URL transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unparseable background color
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Output encoding failures
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RefineError {
    /// Create a new load error for the given source
    pub fn load<S: Into<String>>(role: SourceRole, reason: S) -> Self {
        Self::Load {
            role,
            reason: reason.into(),
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid color error
    pub fn invalid_color<S: Into<String>>(value: S) -> Self {
        Self::InvalidColor(value.into())
    }

    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a network error from a transport failure
    pub fn network_error<E: std::fmt::Display>(context: &str, error: E) -> Self {
        Self::Network(format!("{}: {}", context, error))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Whether this error is a source load failure
    #[must_use]
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::Load { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_error_creation() {
        let err = RefineError::invalid_config("test config error");
        assert!(matches!(err, RefineError::InvalidConfig(_)));

        let err = RefineError::load(SourceRole::Original, "bad header");
        assert!(err.is_load_failure());
        assert!(!RefineError::SessionNotReady.is_load_failure());
    }

    #[test]
    fn test_error_display() {
        let err = RefineError::load(SourceRole::Cutout, "truncated PNG");
        assert_eq!(err.to_string(), "Failed to load cutout image: truncated PNG");

        let err = RefineError::SessionClosed("saved".to_string());
        assert_eq!(err.to_string(), "Editing session is closed (saved)");
    }

    #[test]
    fn test_enhanced_error_context() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = RefineError::file_io_error("write export", Path::new("/out/a.png"), &io_error);
        let error_string = err.to_string();
        assert!(error_string.contains("write export"));
        assert!(error_string.contains("/out/a.png"));

        let err = RefineError::config_value_error("JPEG quality", 150, "0-100", Some(92));
        let error_string = err.to_string();
        assert!(error_string.contains("150"));
        assert!(error_string.contains("0-100"));
        assert!(error_string.contains("Recommended: 92"));

        let err = RefineError::network_error("POST /remove-bg", "connection refused");
        assert_eq!(
            err.to_string(),
            "Network error: POST /remove-bg: connection refused"
        );
    }
}
