//! Vision/OCR Layer
//!
//! Everything between an image file on disk and the fragment list the layout
//! core consumes: image loading and enhancement, the OCR engine handle, and
//! detection filtering.

pub mod engine;
pub mod image_prep;
pub mod pipeline;

pub use engine::{EngineConfig, OcrEngine, RawDetection, SidecarRecognizer, TextRecognizer};
pub use pipeline::{filter_detections, read_text, ReadOutcome, ReadStats};
