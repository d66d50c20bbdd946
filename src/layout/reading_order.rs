//! Manga reading order: top-to-bottom, then right-to-left

use std::cmp::Ordering;

use super::metrics::BoxMetrics;

/// Order two boxes by `center_y` ascending, then `center_x` descending
pub fn reading_order_cmp(a: &BoxMetrics, b: &BoxMetrics) -> Ordering {
    a.center_y
        .total_cmp(&b.center_y)
        .then_with(|| b.center_x.total_cmp(&a.center_x))
}

/// Stable sort of arbitrary items in reading order by their box metrics
pub fn sort_reading_order<T>(items: &mut [T], metrics: impl Fn(&T) -> BoxMetrics) {
    items.sort_by(|a, b| reading_order_cmp(&metrics(a), &metrics(b)));
}
