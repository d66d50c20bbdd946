//! Final ordering of paragraphs across the page
//!
//! Paragraphs in clearly different vertical bands read top-first; paragraphs
//! whose tops sit within half of the left operand's height read left-first.
//! The tolerance depends on the left operand only, so the relation is not
//! transitive for paragraphs of very different heights. The rule is kept
//! as-is and fed to a run-merging sort whose comparison sequence is fixed by
//! the input, so inconsistent triples still land in one reproducible order
//! instead of panicking the way `slice::sort_by` may.

use std::cmp::Ordering;

use super::merge_sort::sort_by_less;
use super::metrics::BoxMetrics;
use super::paragraph::Paragraph;

/// Fraction of `a`'s height within which two tops count as the same row
const SAME_ROW_TOLERANCE: f64 = 0.5;

/// Compare two paragraph boxes; never returns `Equal`
pub fn paragraph_cmp(a: &BoxMetrics, b: &BoxMetrics) -> Ordering {
    let vertical_diff = a.top - b.top;
    if vertical_diff.abs() > a.height * SAME_ROW_TOLERANCE {
        return if vertical_diff < 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    if a.left - b.left < 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Sort paragraphs in place with [`paragraph_cmp`]
///
/// Only "strictly before" answers are consulted, so the asymmetric rule
/// resolves exactly as the run-merging sort asks it.
pub fn order_paragraphs(paragraphs: &mut [Paragraph]) {
    let metrics: Vec<BoxMetrics> = paragraphs.iter().map(Paragraph::metrics).collect();
    let mut order: Vec<usize> = (0..paragraphs.len()).collect();
    sort_by_less(&mut order, |&a, &b| {
        paragraph_cmp(&metrics[a], &metrics[b]) == Ordering::Less
    });
    apply_permutation(paragraphs, order);
}

/// Rearrange `items` so that `items[k]` becomes the old `items[order[k]]`
fn apply_permutation<T>(items: &mut [T], mut order: Vec<usize>) {
    for start in 0..order.len() {
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            items.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}
