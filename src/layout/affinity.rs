//! Pairwise merge decision between two text fragments
//!
//! Two fragments belong to the same speech bubble when their centers are close
//! relative to their typical size and, unless they are very close, their boxes
//! line up along one axis.

use serde::{Deserialize, Serialize};

use super::metrics::BoxMetrics;

/// Below this relative distance, aligned fragments merge
const ALIGNED_MERGE_DISTANCE: f64 = 1.5;
/// Below this relative distance, fragments merge regardless of alignment
const CLOSE_MERGE_DISTANCE: f64 = 0.8;

/// Tunable knobs for the merge predicate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityPolicy {
    /// Hard cutoff on center distance, in units of average box size
    pub max_distance_factor: f64,
    /// Fraction of the smaller box's extent that must overlap to count as aligned
    pub alignment_tolerance: f64,
}

impl Default for AffinityPolicy {
    fn default() -> Self {
        Self {
            max_distance_factor: 2.0,
            alignment_tolerance: 0.3,
        }
    }
}

impl AffinityPolicy {
    pub fn with_max_distance_factor(mut self, factor: f64) -> Self {
        self.max_distance_factor = factor;
        self
    }

    /// Decide whether two fragments belong to the same paragraph
    ///
    /// Symmetric in its arguments. A zero average size counts as an infinite
    /// distance, so degenerate boxes never merge.
    pub fn should_merge(&self, a: &BoxMetrics, b: &BoxMetrics) -> bool {
        let relative = relative_distance(a, b);

        if relative > self.max_distance_factor {
            return false;
        }

        let aligned = horizontally_aligned(a, b, self.alignment_tolerance)
            || vertically_aligned(a, b, self.alignment_tolerance);

        if relative < ALIGNED_MERGE_DISTANCE && aligned {
            return true;
        }

        relative < CLOSE_MERGE_DISTANCE
    }
}

/// Center distance divided by the mean of average width and average height
pub fn relative_distance(a: &BoxMetrics, b: &BoxMetrics) -> f64 {
    let avg_width = (a.width + b.width) / 2.0;
    let avg_height = (a.height + b.height) / 2.0;
    let avg_size = (avg_width + avg_height) / 2.0;

    if avg_size > 0.0 {
        a.center_distance(b) / avg_size
    } else {
        f64::INFINITY
    }
}

/// Same row: vertical overlap exceeds `tolerance` of the shorter box's height
pub fn horizontally_aligned(a: &BoxMetrics, b: &BoxMetrics, tolerance: f64) -> bool {
    let overlap = (a.bottom.min(b.bottom) - a.top.max(b.top)).max(0.0);
    overlap > a.height.min(b.height) * tolerance
}

/// Same column: horizontal overlap exceeds `tolerance` of the narrower box's width
pub fn vertically_aligned(a: &BoxMetrics, b: &BoxMetrics, tolerance: f64) -> bool {
    let overlap = (a.right.min(b.right) - a.left.max(b.left)).max(0.0);
    overlap > a.width.min(b.width) * tolerance
}
