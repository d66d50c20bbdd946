//! Recognized text fragments, the input to paragraph grouping

use serde::{Deserialize, Serialize};

use super::metrics::{BoxMetrics, Quad};

/// One OCR-detected text region
///
/// Fragments reaching the layout core have already been trimmed and filtered
/// by confidence; the core never re-validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Detected box, possibly rotated
    pub bbox: Quad,
    /// Recognized text
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl Fragment {
    pub fn new(bbox: Quad, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }

    pub fn metrics(&self) -> BoxMetrics {
        self.bbox.metrics()
    }
}
