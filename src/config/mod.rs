//! Application Configuration
//!
//! Reader settings stored in TOML format. Every section and field is
//! optional in the file; missing values take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::layout::AffinityPolicy;

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR engine and fragment filtering
    pub ocr: OcrSettings,
    /// Image preparation before OCR
    pub image: ImageSettings,
    /// Paragraph grouping
    pub layout: AffinityPolicy,
}

/// OCR engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Language used when a command does not name one
    pub language: String,
    /// Fragments scoring below this are dropped before grouping
    pub min_confidence: f64,
    /// Detector binarization threshold
    pub det_db_thresh: f32,
    /// Detector box score threshold
    pub det_db_box_thresh: f32,
    /// Detector box expansion ratio
    pub det_db_unclip_ratio: f32,
    /// Suffix appended to the image path to find recognizer output
    pub sidecar_suffix: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            min_confidence: 0.1,
            det_db_thresh: 0.3,
            det_db_box_thresh: 0.4,
            det_db_unclip_ratio: 1.6,
            sidecar_suffix: ".ocr.json".to_string(),
        }
    }
}

/// Image preparation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// Longest side after downscaling, in pixels
    pub max_dimension: u32,
    /// Contrast enhancement factor (1.0 = unchanged)
    pub contrast: f32,
    /// Sharpness enhancement factor (1.0 = unchanged)
    pub sharpness: f32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_dimension: 1200,
            contrast: 1.3,
            sharpness: 1.4,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: AppConfig =
        toml::from_str(&content).with_context(|| format!("Invalid config file: {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
