//! Paragraph Layout
//!
//! Groups recognized text fragments into speech-bubble paragraphs and puts
//! them in manga reading order (right-to-left, top-to-bottom).
//!
//! Pipeline: reading-order pre-sort, transitive-closure clustering, per-cluster
//! assembly with an intra-paragraph reading-order sort, then a final
//! cross-paragraph ordering. Everything here is pure and synchronous.

pub mod affinity;
pub mod cluster;
pub mod fragment;
mod merge_sort;
pub mod metrics;
pub mod ordering;
pub mod paragraph;
pub mod reading_order;

pub use affinity::AffinityPolicy;
pub use cluster::ClusterBuilder;
pub use fragment::Fragment;
pub use metrics::{BoxMetrics, GeometryError, Point, Quad};
pub use ordering::{order_paragraphs, paragraph_cmp};
pub use paragraph::{assemble_paragraph, Paragraph, ParagraphItem};
pub use reading_order::{reading_order_cmp, sort_reading_order};

use tracing::debug;

/// Group fragments into ordered paragraphs
///
/// Every input fragment lands in exactly one paragraph. An empty input
/// yields an empty list.
pub fn group_paragraphs(fragments: &[Fragment], policy: &AffinityPolicy) -> Vec<Paragraph> {
    if fragments.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Fragment> = fragments.iter().collect();
    sort_reading_order(&mut sorted, |f| f.metrics());

    let boxes: Vec<BoxMetrics> = sorted.iter().map(|f| f.metrics()).collect();
    let clusters = ClusterBuilder::new(*policy).build(&boxes);

    let mut paragraphs: Vec<Paragraph> = clusters
        .iter()
        .filter_map(|cluster| {
            let mut members: Vec<&Fragment> = cluster.iter().map(|&i| sorted[i]).collect();
            sort_reading_order(&mut members, |f| f.metrics());
            assemble_paragraph(&members)
        })
        .collect();

    order_paragraphs(&mut paragraphs);

    debug!(
        "Grouped {} fragments into {} paragraphs (max_distance_factor={})",
        fragments.len(),
        paragraphs.len(),
        policy.max_distance_factor
    );

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(text: &str, l: f64, t: f64, r: f64, b: f64, confidence: f64) -> Fragment {
        Fragment::new(Quad::axis_aligned(l, t, r, b), text, confidence)
    }

    #[test]
    fn test_empty_input() {
        assert!(group_paragraphs(&[], &AffinityPolicy::default()).is_empty());
    }

    #[test]
    fn test_same_row_reads_right_to_left() {
        let fragments = vec![
            fragment("left", 0.0, 0.0, 50.0, 20.0, 0.9),
            fragment("right", 50.0, 0.0, 100.0, 20.0, 0.7),
        ];
        let paragraphs = group_paragraphs(&fragments, &AffinityPolicy::default());

        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text, "right left");
        assert_eq!(paragraphs[0].item_count, 2);
        assert!((paragraphs[0].score - 0.8).abs() < 1e-6);
        assert_eq!(paragraphs[0].bbox, Quad::axis_aligned(0.0, 0.0, 100.0, 20.0));
    }

    #[test]
    fn test_bubble_lines_top_to_bottom() {
        let fragments = vec![
            fragment("third", 0.0, 60.0, 40.0, 80.0, 0.9),
            fragment("first", 0.0, 0.0, 40.0, 20.0, 0.9),
            fragment("second", 0.0, 30.0, 40.0, 50.0, 0.9),
        ];
        let paragraphs = group_paragraphs(&fragments, &AffinityPolicy::default());
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text, "first second third");
    }

    #[test]
    fn test_paragraphs_ordered_across_page() {
        let fragments = vec![
            fragment("lower", 100.0, 400.0, 140.0, 420.0, 0.9),
            fragment("upper-right", 500.0, 0.0, 540.0, 20.0, 0.9),
            fragment("upper-left", 0.0, 4.0, 40.0, 24.0, 0.9),
        ];
        let paragraphs = group_paragraphs(&fragments, &AffinityPolicy::default());
        let texts: Vec<_> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["upper-left", "upper-right", "lower"]);
    }

    #[test]
    fn test_distance_factor_tightens_grouping() {
        let fragments = vec![
            fragment("a", 0.0, 0.0, 40.0, 20.0, 0.9),
            fragment("b", 0.0, 30.0, 40.0, 50.0, 0.9),
        ];
        // relative distance 1.0, aligned in the same column
        assert_eq!(group_paragraphs(&fragments, &AffinityPolicy::default()).len(), 1);

        let strict = AffinityPolicy::default().with_max_distance_factor(0.9);
        assert_eq!(group_paragraphs(&fragments, &strict).len(), 2);
    }
}
