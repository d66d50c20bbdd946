//! Image-to-paragraphs pipeline
//!
//! Runs image preparation and recognition, filters the raw detections and
//! hands the survivors to the layout core. Both the flat fragment list and
//! the grouped paragraphs are returned.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use super::engine::{OcrEngine, RawDetection};
use super::image_prep;
use crate::config::AppConfig;
use crate::layout::{group_paragraphs, Fragment, Paragraph, Quad};

/// Fragments above this confidence count as high confidence in stats
const HIGH_CONFIDENCE: f64 = 0.7;

/// Summary numbers for one processed image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadStats {
    pub total_lines: usize,
    pub total_paragraphs: usize,
    pub processing_time: String,
    pub image_size: u64,
    pub average_confidence: String,
    pub high_confidence_ratio: String,
    pub language: String,
}

/// Result of reading one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadOutcome {
    /// Filtered fragments in recognizer order
    pub data: Vec<Fragment>,
    /// Fragments grouped into ordered paragraphs
    pub paragraphs: Vec<Paragraph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReadStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReadOutcome {
    fn nothing_detected() -> Self {
        Self {
            data: vec![],
            paragraphs: vec![],
            stats: None,
            message: Some("No text detected in image".to_string()),
        }
    }
}

/// Trim, filter and validate raw detections into fragments
///
/// Drops detections whose trimmed text is empty, whose score is below
/// `min_confidence`, or whose box is not four finite points.
pub fn filter_detections(detections: Vec<RawDetection>, min_confidence: f64) -> Vec<Fragment> {
    detections
        .into_iter()
        .filter_map(|det| {
            let text = det.text.trim();
            if text.is_empty() || det.score.is_nan() || det.score < min_confidence {
                return None;
            }
            match Quad::from_points(&det.bbox) {
                Ok(bbox) => Some(Fragment::new(bbox, text, det.score)),
                Err(e) => {
                    warn!("Skipping detection {:?}: {}", text, e);
                    None
                }
            }
        })
        .collect()
}

/// Read text from an image file and group it into paragraphs
pub fn read_text(engine: &mut OcrEngine, path: &Path, config: &AppConfig) -> Result<ReadOutcome> {
    let start = Instant::now();
    info!("Processing image with language: {}", engine.language());

    let image = image_prep::load_for_ocr(path, &config.image)?;
    let detections = engine.recognize(&image, path)?;
    drop(image);

    if detections.is_empty() {
        return Ok(ReadOutcome::nothing_detected());
    }

    let fragments = filter_detections(detections, config.ocr.min_confidence);
    let paragraphs = group_paragraphs(&fragments, &config.layout);

    let image_size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat image: {:?}", path))?
        .len();
    let stats = summarize(
        &fragments,
        paragraphs.len(),
        start.elapsed().as_secs_f64(),
        image_size,
        engine.language(),
    );

    info!(
        "Found {} text elements in {} ({} paragraphs)",
        stats.total_lines, stats.processing_time, stats.total_paragraphs
    );
    info!("Avg confidence: {}", stats.average_confidence);

    Ok(ReadOutcome {
        data: fragments,
        paragraphs,
        stats: Some(stats),
        message: None,
    })
}

fn summarize(
    fragments: &[Fragment],
    total_paragraphs: usize,
    elapsed_secs: f64,
    image_size: u64,
    language: &str,
) -> ReadStats {
    let total = fragments.len();
    let average = if total > 0 {
        fragments.iter().map(|f| f.confidence).sum::<f64>() / total as f64
    } else {
        0.0
    };
    let high = fragments
        .iter()
        .filter(|f| f.confidence > HIGH_CONFIDENCE)
        .count();

    ReadStats {
        total_lines: total,
        total_paragraphs,
        processing_time: format!("{:.3}s", elapsed_secs),
        image_size,
        average_confidence: format!("{:.3}", average),
        high_confidence_ratio: format!("{}/{}", high, total),
        language: language.to_string(),
    }
}
