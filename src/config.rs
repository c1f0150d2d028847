// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Loaded from a YAML file named on the command line or by
//! `VELOCITYVIEW_CONFIG`. Every field has a default, so a partial file (or
//! no file at all) is valid.

use crate::io::capture::DEFAULT_JPEG_QUALITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "VELOCITYVIEW_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub viewer: ViewerConfig,
    pub coach: CoachConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            data_dir: PathBuf::from(".velocityview"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// On-screen stroke width in pixels, independent of zoom.
    pub stroke_width: f64,
    /// Frame rate assumed for image-sequence media.
    pub sequence_fps: f64,
    /// Zoom change per scrolled point.
    pub wheel_zoom_sensitivity: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            stroke_width: 3.0,
            sequence_fps: 30.0,
            wheel_zoom_sensitivity: 0.001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub model: String,
    pub fallback_model: String,
    /// Attempts per model for transient failures.
    pub max_retries: u32,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub jpeg_quality: u8,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-pro-preview".to_string(),
            fallback_model: "gemini-2.5-flash".to_string(),
            max_retries: 3,
            api_key_env: "GEMINI_API_KEY".to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CoachConfig {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl AppConfig {
    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path`, or `VELOCITYVIEW_CONFIG`, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => {
                log::info!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "storage:\n  backend: memory\nviewer:\n  stroke_width: 5.0\ncoach:\n  max_retries: 1\n",
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.data_dir, PathBuf::from(".velocityview"));
        assert_eq!(config.viewer.stroke_width, 5.0);
        assert_eq!(config.viewer.sequence_fps, 30.0);
        assert_eq!(config.coach.max_retries, 1);
        assert_eq!(config.coach.model, "gemini-3-pro-preview");
        assert_eq!(config.coach.jpeg_quality, 98);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "storage: [1, 2").unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let coach = CoachConfig {
            api_key_env: "VELOCITYVIEW_TEST_BLANK_KEY".to_string(),
            ..CoachConfig::default()
        };
        std::env::set_var("VELOCITYVIEW_TEST_BLANK_KEY", "  ");
        assert!(coach.api_key().is_none());
        std::env::set_var("VELOCITYVIEW_TEST_BLANK_KEY", "abc");
        assert_eq!(coach.api_key().as_deref(), Some("abc"));
    }
}
