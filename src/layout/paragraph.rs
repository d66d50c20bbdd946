//! Paragraph records built from one closed cluster

use serde::{Deserialize, Serialize};

use super::fragment::Fragment;
use super::metrics::{BoxMetrics, Quad};

/// One member fragment as reported inside a paragraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphItem {
    pub bbox: Quad,
    pub text: String,
    pub score: f64,
}

impl From<&Fragment> for ParagraphItem {
    fn from(fragment: &Fragment) -> Self {
        Self {
            bbox: fragment.bbox,
            text: fragment.text.clone(),
            score: fragment.confidence,
        }
    }
}

/// A speech bubble's worth of merged text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Member texts joined by single spaces, in reading order
    pub text: String,
    /// Axis-aligned box enclosing every member box
    pub bbox: Quad,
    /// Mean member confidence
    pub score: f64,
    pub item_count: usize,
    #[serde(rename = "individual_items")]
    pub items: Vec<ParagraphItem>,
}

impl Paragraph {
    pub fn metrics(&self) -> BoxMetrics {
        self.bbox.metrics()
    }
}

/// Build a paragraph from members already sorted in reading order
///
/// Returns `None` for an empty member list.
pub fn assemble_paragraph(members: &[&Fragment]) -> Option<Paragraph> {
    if members.is_empty() {
        return None;
    }

    let text = members
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let score = members.iter().map(|f| f.confidence).sum::<f64>() / members.len() as f64;

    Some(Paragraph {
        text,
        bbox: collective_bbox(members),
        score,
        item_count: members.len(),
        items: members.iter().map(|f| ParagraphItem::from(*f)).collect(),
    })
}

/// Smallest axis-aligned quad containing every point of every member box
fn collective_bbox(members: &[&Fragment]) -> Quad {
    let points: Vec<_> = members.iter().flat_map(|f| f.bbox.0).collect();
    let m = BoxMetrics::from_points(&points);
    Quad::axis_aligned(m.left, m.top, m.right, m.bottom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::Point;

    #[test]
    fn test_empty_cluster_has_no_paragraph() {
        assert!(assemble_paragraph(&[]).is_none());
    }

    #[test]
    fn test_single_fragment_paragraph() {
        let fragment = Fragment::new(
            Quad([
                Point::new(12.0, 4.0),
                Point::new(60.0, 8.0),
                Point::new(58.0, 30.0),
                Point::new(10.0, 26.0),
            ]),
            "hello",
            0.87,
        );
        let paragraph = assemble_paragraph(&[&fragment]).unwrap();

        assert_eq!(paragraph.text, "hello");
        assert_eq!(paragraph.item_count, 1);
        assert_eq!(paragraph.score, 0.87);
        assert_eq!(paragraph.bbox, Quad::axis_aligned(10.0, 4.0, 60.0, 30.0));
        assert_eq!(paragraph.items[0].bbox, fragment.bbox);
    }

    #[test]
    fn test_joins_text_and_averages_score() {
        let a = Fragment::new(Quad::axis_aligned(60.0, 0.0, 100.0, 20.0), "first", 0.9);
        let b = Fragment::new(Quad::axis_aligned(0.0, 0.0, 50.0, 20.0), "second", 0.5);
        let c = Fragment::new(Quad::axis_aligned(20.0, 25.0, 70.0, 45.0), "third", 0.7);
        let paragraph = assemble_paragraph(&[&a, &b, &c]).unwrap();

        assert_eq!(paragraph.text, "first second third");
        assert_eq!(paragraph.item_count, 3);
        assert!((paragraph.score - 0.7).abs() < 1e-6);
        assert_eq!(paragraph.bbox, Quad::axis_aligned(0.0, 0.0, 100.0, 45.0));
        let texts: Vec<_> = paragraph.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_paragraph_json_fields() {
        let a = Fragment::new(Quad::axis_aligned(0.0, 0.0, 10.0, 10.0), "a", 0.5);
        let paragraph = assemble_paragraph(&[&a]).unwrap();
        let value = serde_json::to_value(&paragraph).unwrap();

        assert_eq!(value["text"], "a");
        assert_eq!(value["item_count"], 1);
        assert_eq!(value["individual_items"][0]["score"], 0.5);
        assert_eq!(value["bbox"][2][0], 10.0);
    }
}
