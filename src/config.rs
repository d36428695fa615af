//! Configuration types for mask editing and export

use crate::{
    error::{RefineError, Result},
    types::BrushMode,
};
use serde::{Deserialize, Serialize};

/// Output encoding chosen for an exported composite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputEncoding {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, background baked in)
    Jpeg,
}

impl Default for OutputEncoding {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Configuration for editing sessions, export and the remote cutout service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Smallest brush diameter offered to the user, in display pixels
    pub min_brush_size: u32,

    /// Largest brush diameter offered to the user, in display pixels
    pub max_brush_size: u32,

    /// Brush diameter selected when a session opens
    pub default_brush_size: u32,

    /// Tool selected when a session opens
    pub default_mode: BrushMode,

    /// JPEG quality (0-100) for exports with an opaque background
    pub jpeg_quality: u8,

    /// Prefix of exported file names (`<prefix>_<timestamp>.<ext>`)
    pub file_prefix: String,

    /// Base URL of the background removal service
    pub remote_endpoint: String,

    /// Timeout for remote requests, in seconds
    pub request_timeout_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_brush_size: 10,
            max_brush_size: 100,
            default_brush_size: 20,
            default_mode: BrushMode::Erase,
            jpeg_quality: 92,
            file_prefix: "removed_bg".to_string(),
            remote_endpoint: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl EditorConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    /// ```rust
    /// use bgrefine::EditorConfig;
    ///
    /// let config = EditorConfig::builder()
    ///     .brush_range(5, 200)
    ///     .jpeg_quality(85)
    ///     .file_prefix("portrait")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.max_brush_size, 200);
    /// ```
    #[must_use]
    pub fn builder() -> EditorConfigBuilder {
        EditorConfigBuilder::default()
    }

    /// Clamp a requested brush size to the configured range
    #[must_use]
    pub fn clamp_brush_size(&self, size: u32) -> u32 {
        size.clamp(self.min_brush_size, self.max_brush_size)
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Brush sizes: `0 < min <= default <= max`
    /// - JPEG quality: 0-100 (inclusive)
    /// - File prefix: not empty, no path separators
    pub fn validate(&self) -> Result<()> {
        if self.min_brush_size == 0 {
            return Err(RefineError::config_value_error(
                "minimum brush size",
                self.min_brush_size,
                "1 or more",
                Some(10),
            ));
        }

        if self.min_brush_size > self.max_brush_size {
            return Err(RefineError::invalid_config(format!(
                "Minimum brush size {} exceeds maximum {}",
                self.min_brush_size, self.max_brush_size
            )));
        }

        if self.default_brush_size < self.min_brush_size
            || self.default_brush_size > self.max_brush_size
        {
            return Err(RefineError::config_value_error(
                "default brush size",
                self.default_brush_size,
                &format!("{}-{}", self.min_brush_size, self.max_brush_size),
                None,
            ));
        }

        if self.jpeg_quality > 100 {
            return Err(RefineError::config_value_error(
                "JPEG quality",
                self.jpeg_quality,
                "0-100",
                Some(92),
            ));
        }

        if self.file_prefix.is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(RefineError::invalid_config(format!(
                "File prefix '{}' must be non-empty and contain no path separators",
                self.file_prefix
            )));
        }

        Ok(())
    }
}

/// Builder for `EditorConfig`
#[derive(Debug, Default)]
pub struct EditorConfigBuilder {
    config: EditorConfig,
}

impl EditorConfigBuilder {
    /// Set the brush size range
    #[must_use]
    pub fn brush_range(mut self, min: u32, max: u32) -> Self {
        self.config.min_brush_size = min;
        self.config.max_brush_size = max;
        self.config.default_brush_size = self.config.default_brush_size.clamp(min, max.max(min));
        self
    }

    /// Set the initial brush size
    #[must_use]
    pub fn default_brush_size(mut self, size: u32) -> Self {
        self.config.default_brush_size = size;
        self
    }

    /// Set the initial tool
    #[must_use]
    pub fn default_mode(mut self, mode: BrushMode) -> Self {
        self.config.default_mode = mode;
        self
    }

    /// Set JPEG quality
    #[must_use]
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.min(100);
        self
    }

    /// Set export file name prefix
    #[must_use]
    pub fn file_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Set the background removal service base URL
    #[must_use]
    pub fn remote_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.config.remote_endpoint = endpoint.into();
        self
    }

    /// Set the remote request timeout
    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EditorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
