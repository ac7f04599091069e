//! # Runtime Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid config.
//!
//! ```toml
//! width = 320
//! height = 240
//! target_fps = 60
//! backend = "headless"
//! sample_rate = 44100
//! audio = true
//! scratch_bytes = 65536
//! max_frames = 600
//! slow_frame_ms = 33
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::ConfigError;

/// Configuration for the [`Runtime`](crate::runtime::Runtime).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Surface width in pixels.
    pub width: usize,
    /// Surface height in pixels.
    pub height: usize,
    /// Frames per second to pace the loop at. 0 runs unpaced.
    pub target_fps: u32,
    /// Which backend to create.
    pub backend: BackendKind,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Open audio at init and play `Sound` events.
    pub audio: bool,
    /// Bytes of per-frame scratch memory handed to layers.
    pub scratch_bytes: usize,
    /// Stop after this many frames. `None` runs until stopped.
    pub max_frames: Option<u64>,
    /// Frames slower than this are logged as warnings.
    pub slow_frame_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            target_fps: 60,
            backend: BackendKind::Headless,
            sample_rate: crate::audio::DEFAULT_SAMPLE_RATE,
            audio: true,
            scratch_bytes: 64 * 1024,
            max_frames: None,
            slow_frame_ms: 33,
        }
    }
}

impl RuntimeConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown fields,
    /// [`ConfigError::Invalid`] for values the runtime can't use.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file can't be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "configuration loaded");
        tracing::debug!(?config);
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "surface size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be non-zero".into()));
        }
        if self.target_fps > 1000 {
            return Err(ConfigError::Invalid(format!(
                "target_fps {} is above 1000",
                self.target_fps
            )));
        }
        Ok(())
    }

    /// Time budget of one frame, or `None` when unpaced.
    #[must_use]
    pub fn frame_time(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs(1) / self.target_fps)
    }

    /// Frames slower than this are reported.
    #[must_use]
    pub const fn slow_frame_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_frame_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            width = 64
            height = 48
            backend = "log"
            target_fps = 0
            max_frames = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 48);
        assert_eq!(config.backend, BackendKind::Log);
        assert_eq!(config.max_frames, Some(10));
        assert_eq!(config.frame_time(), None);
        assert_eq!(config.sample_rate, 44_100);
    }

    #[test]
    fn test_frame_time() {
        let config = RuntimeConfig { target_fps: 50, ..Default::default() };
        assert_eq!(config.frame_time(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("width = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("sample_rate = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("width = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("colour_depth = 32"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_toml_str("backend = \"sdl\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = RuntimeConfig::load("/nonexistent/ege.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/ege.toml"));
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = RuntimeConfig {
            backend: BackendKind::Log,
            max_frames: Some(3),
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(RuntimeConfig::from_toml_str(&text).unwrap(), config);
    }
}
