use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForgeError, Result};

const APP_DIR: &str = "adforge";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub generation: GenerationConfig,
    pub export: ExportConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub edit_model: String,
    pub speech_model: String,
    pub voice: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            text_model: "gemini-2.5-pro".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            edit_model: "gemini-2.5-flash-image".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Ad-copy variations per single-mode request.
    pub variations: usize,
    pub carousel_slides: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            variations: 3,
            carousel_slides: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Device-pixel multiplier before zoom compensation.
    pub pixel_ratio: f32,
    #[serde(with = "humantime_serde")]
    pub paint_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub image_load_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub single_slide_image_load_timeout: Duration,
    pub file_prefix: String,
    pub background: String,
    pub output_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            paint_delay: Duration::from_millis(150),
            settle_delay: Duration::from_millis(200),
            image_load_timeout: Duration::from_secs(10),
            single_slide_image_load_timeout: Duration::from_secs(15),
            file_prefix: "ad-creative".to_string(),
            background: "#ffffff".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Location of the session-scoped store; defaults to a per-user dir under the OS temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            session_dir: None,
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

impl Config {
    /// `$XDG_CONFIG_HOME/adforge/config.toml`, falling back to `~/.config/adforge/config.toml`.
    pub fn central_config_path() -> Option<PathBuf> {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".config")))
            .map(|base| base.join(APP_DIR).join("config.toml"))
    }

    /// Priority: explicit path > central config (when it exists) > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::central_config_path() {
            Some(central) if central.is_file() => Self::from_file(&central),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ForgeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.export.pixel_ratio.is_finite() && self.export.pixel_ratio > 0.0) {
            return Err(ForgeError::Config(
                "export.pixel_ratio must be greater than zero".to_string(),
            ));
        }
        if self.generation.variations == 0 {
            return Err(ForgeError::Config(
                "generation.variations must be at least 1".to_string(),
            ));
        }
        if self.generation.carousel_slides == 0 {
            return Err(ForgeError::Config(
                "generation.carousel_slides must be at least 1".to_string(),
            ));
        }
        let models = [
            ("api.text_model", &self.api.text_model),
            ("api.image_model", &self.api.image_model),
            ("api.edit_model", &self.api.edit_model),
            ("api.speech_model", &self.api.speech_model),
        ];
        if let Some((name, _)) = models.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ForgeError::Config(format!("{name} must not be empty")));
        }
        if !crate::style::is_hex_color(&self.export.background) {
            return Err(ForgeError::Config(format!(
                "export.background must be a hex color, got {}",
                self.export.background
            )));
        }
        Ok(())
    }
}
