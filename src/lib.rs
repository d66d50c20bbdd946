//! BubbleReader - reading-ordered text extraction for manga pages
//!
//! Groups OCR text fragments into speech-bubble paragraphs and orders them
//! right-to-left, top-to-bottom. The geometric core lives in [`layout`]; the
//! [`vision`] layer turns image files into fragments, and [`app`] drives the
//! line-oriented command protocol.

pub mod app;
pub mod config;
pub mod layout;
pub mod protocol;
pub mod storage;
pub mod vision;

pub use config::AppConfig;
pub use layout::{group_paragraphs, AffinityPolicy, Fragment, Paragraph};
