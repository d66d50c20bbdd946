//! OCR engine handle
//!
//! The recognition model runs outside this crate. An [`OcrEngine`] is an
//! explicit resource owned by its caller: created for one language, used for
//! any number of images, then dropped or closed. Recognizers plug in through
//! the [`TextRecognizer`] trait.

use anyhow::{ensure, Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OcrSettings;
use crate::layout::Point;

/// One raw `(box, text, score)` triple from a recognizer
///
/// Deserializes from either `[box, text, score]` or an object with those
/// field names. The box is not validated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: Vec<Point>,
    pub text: String,
    pub score: f64,
}

/// Detector and recognizer parameters for one engine instance
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub language: String,
    pub det_db_thresh: f32,
    pub det_db_box_thresh: f32,
    pub det_db_unclip_ratio: f32,
    pub sidecar_suffix: String,
}

impl EngineConfig {
    /// Engine settings for `language`, other values from the config file
    pub fn from_settings(settings: &OcrSettings, language: &str) -> Self {
        Self {
            language: language.to_string(),
            det_db_thresh: settings.det_db_thresh,
            det_db_box_thresh: settings.det_db_box_thresh,
            det_db_unclip_ratio: settings.det_db_unclip_ratio,
            sidecar_suffix: settings.sidecar_suffix.clone(),
        }
    }
}

impl EngineConfig {
    /// Reject settings no detector could run with
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.language.trim().is_empty(), "Language must not be empty");
        ensure!(
            (0.0..=1.0).contains(&self.det_db_thresh),
            "det_db_thresh must be within 0..=1, got {}",
            self.det_db_thresh
        );
        ensure!(
            (0.0..=1.0).contains(&self.det_db_box_thresh),
            "det_db_box_thresh must be within 0..=1, got {}",
            self.det_db_box_thresh
        );
        ensure!(
            self.det_db_unclip_ratio > 0.0,
            "det_db_unclip_ratio must be positive, got {}",
            self.det_db_unclip_ratio
        );
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&OcrSettings::default(), &OcrSettings::default().language)
    }
}

/// A text recognition backend
pub trait TextRecognizer: Send {
    /// Recognize text in a prepared image loaded from `source`
    fn recognize(&mut self, image: &RgbImage, source: &Path) -> Result<Vec<RawDetection>>;
}

/// Reads detections written next to the image by an external model runner
///
/// For `page.png` the runner output is expected at `page.png<suffix>`
/// (`page.png.ocr.json` by default) as a JSON list of `[box, text, score]`.
/// A missing file means nothing was detected.
#[derive(Debug, Clone)]
pub struct SidecarRecognizer {
    suffix: String,
}

impl SidecarRecognizer {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn sidecar_path(&self, source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_owned();
        name.push(&self.suffix);
        PathBuf::from(name)
    }
}

impl TextRecognizer for SidecarRecognizer {
    fn recognize(&mut self, image: &RgbImage, source: &Path) -> Result<Vec<RawDetection>> {
        let path = self.sidecar_path(source);
        if !path.exists() {
            debug!("No recognizer output at {:?}", path);
            return Ok(vec![]);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read recognizer output: {:?}", path))?;
        let detections: Vec<RawDetection> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid recognizer output: {:?}", path))?;

        debug!(
            "Read {} detections for {}x{} image from {:?}",
            detections.len(),
            image.width(),
            image.height(),
            path
        );
        Ok(detections)
    }
}

/// OCR engine bound to one language
pub struct OcrEngine {
    config: EngineConfig,
    recognizer: Box<dyn TextRecognizer>,
}

impl OcrEngine {
    /// Create an engine backed by the sidecar recognizer
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let recognizer = SidecarRecognizer::new(config.sidecar_suffix.clone());
        Ok(Self::with_recognizer(config, Box::new(recognizer)))
    }

    /// Create an engine with a custom recognizer
    pub fn with_recognizer(config: EngineConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        info!(
            "OCR engine initialized for {} (det_db_thresh={}, det_db_box_thresh={}, unclip={})",
            config.language, config.det_db_thresh, config.det_db_box_thresh, config.det_db_unclip_ratio
        );
        Self { config, recognizer }
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Run recognition on a prepared image
    pub fn recognize(&mut self, image: &RgbImage, source: &Path) -> Result<Vec<RawDetection>> {
        info!("Running OCR ({})...", self.config.language);
        self.recognizer.recognize(image, source)
    }
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine").field("config", &self.config).finish()
    }
}
