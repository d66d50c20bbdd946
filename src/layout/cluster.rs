//! Transitive-closure grouping of fragments into paragraphs
//!
//! Membership is tracked by index in a private `used` table owned by one
//! [`ClusterBuilder::build`] call, so the caller's fragments are never touched.

use tracing::trace;

use super::affinity::AffinityPolicy;
use super::metrics::BoxMetrics;

/// Groups boxes into clusters using an [`AffinityPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterBuilder {
    policy: AffinityPolicy,
}

impl ClusterBuilder {
    pub fn new(policy: AffinityPolicy) -> Self {
        Self { policy }
    }

    /// Partition `boxes` into clusters of indices
    ///
    /// Seeds are taken in slice order, so callers pass boxes already in
    /// reading order. Each cluster grows until a full pass over the unused
    /// boxes adds nothing; a box joins when it is affine to any current member,
    /// including members added earlier in the same pass. Every index appears in
    /// exactly one cluster and no cluster is empty.
    ///
    /// Cost is O(n^2) per expansion pass, O(n^3) in the worst case.
    pub fn build(&self, boxes: &[BoxMetrics]) -> Vec<Vec<usize>> {
        let mut used = vec![false; boxes.len()];
        let mut clusters = Vec::new();

        for seed in 0..boxes.len() {
            if used[seed] {
                continue;
            }

            used[seed] = true;
            let mut members = vec![seed];

            let mut expanded = true;
            while expanded {
                expanded = false;

                for candidate in 0..boxes.len() {
                    if used[candidate] {
                        continue;
                    }

                    let joins = members
                        .iter()
                        .any(|&m| self.policy.should_merge(&boxes[m], &boxes[candidate]));

                    if joins {
                        used[candidate] = true;
                        members.push(candidate);
                        expanded = true;
                    }
                }
            }

            trace!("Closed cluster seeded at {} with {} members", seed, members.len());
            clusters.push(members);
        }

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::Quad;

    fn rect(l: f64, t: f64, r: f64, b: f64) -> BoxMetrics {
        Quad::axis_aligned(l, t, r, b).metrics()
    }

    fn assert_partition(clusters: &[Vec<usize>], n: usize) {
        let mut seen = vec![0usize; n];
        for cluster in clusters {
            assert!(!cluster.is_empty());
            for &i in cluster {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "not a partition: {:?}", seen);
    }

    #[test]
    fn test_empty_input() {
        let clusters = ClusterBuilder::default().build(&[]);
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_single_box() {
        let clusters = ClusterBuilder::default().build(&[rect(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(clusters, vec![vec![0]]);
    }

    #[test]
    fn test_isolated_boxes_stay_apart() {
        let boxes = [
            rect(0.0, 0.0, 20.0, 20.0),
            rect(500.0, 0.0, 520.0, 20.0),
            rect(0.0, 500.0, 20.0, 520.0),
        ];
        let clusters = ClusterBuilder::default().build(&boxes);
        assert_eq!(clusters, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_chain_is_closed_transitively() {
        // A-B and B-C are each 1.43 apart in relative terms, A-C is 2.86
        let boxes = [
            rect(0.0, 0.0, 50.0, 20.0),
            rect(50.0, 0.0, 100.0, 20.0),
            rect(100.0, 0.0, 150.0, 20.0),
        ];
        let policy = AffinityPolicy::default();
        assert!(policy.should_merge(&boxes[0], &boxes[1]));
        assert!(policy.should_merge(&boxes[1], &boxes[2]));
        assert!(!policy.should_merge(&boxes[0], &boxes[2]));

        let clusters = ClusterBuilder::new(policy).build(&boxes);
        assert_eq!(clusters.len(), 1);
        assert_partition(&clusters, 3);
    }

    #[test]
    fn test_chain_found_from_the_far_end() {
        // Seed C is reachable from A only through B, which comes last
        let boxes = [
            rect(0.0, 0.0, 50.0, 20.0),
            rect(100.0, 0.0, 150.0, 20.0),
            rect(50.0, 0.0, 100.0, 20.0),
        ];
        let clusters = ClusterBuilder::default().build(&boxes);
        assert_eq!(clusters, vec![vec![0, 2, 1]]);
    }

    #[test]
    fn test_two_bubbles() {
        let boxes = [
            rect(0.0, 0.0, 40.0, 20.0),
            rect(300.0, 0.0, 340.0, 20.0),
            rect(0.0, 30.0, 40.0, 50.0),
            rect(300.0, 30.0, 340.0, 50.0),
            rect(0.0, 60.0, 40.0, 80.0),
        ];
        let clusters = ClusterBuilder::default().build(&boxes);
        assert_eq!(clusters, vec![vec![0, 2, 4], vec![1, 3]]);
        assert_partition(&clusters, boxes.len());
    }

    #[test]
    fn test_partition_on_grid() {
        let mut boxes = Vec::new();
        for row in 0..6 {
            for col in 0..6 {
                let x = col as f64 * 37.0 + (row % 2) as f64 * 11.0;
                let y = row as f64 * 29.0;
                let w = 10.0 + ((row * 7 + col * 3) % 5) as f64 * 6.0;
                boxes.push(rect(x, y, x + w, y + 12.0));
            }
        }
        let clusters = ClusterBuilder::default().build(&boxes);
        assert_partition(&clusters, boxes.len());
    }
}
