//! Structural validation of clustering results.
//!
//! Checks the invariants a finished run must satisfy: the nearest-higher
//! links form a forest rooted at seeds and unlinked points, every link points
//! to a denser neighbour, and cluster ids flow unchanged from a seed to all
//! of its descendants. Useful for debugging and testing.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::points::{PointsHost, NONE, UNASSIGNED};

/// Counts and defect tallies for one clustered point set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusteringReport {
    pub num_points: usize,
    pub num_seeds: usize,
    /// Distinct cluster ids in use.
    pub num_clusters: usize,
    /// Points with no cluster id.
    pub unassigned: usize,
    /// Size of the largest cluster.
    pub largest_cluster: usize,

    /// Links that point outside the point set or at the point itself.
    pub dangling_links: usize,
    /// Points whose link chain never reaches a root.
    pub cyclic_points: usize,
    /// Links to a neighbour that is not denser.
    pub non_denser_links: usize,
    /// Linked non-seeds whose id differs from their parent's.
    pub label_mismatches: usize,
    /// Seeds that still carry a link.
    pub seeds_with_link: usize,
    /// Seeds without a cluster id, or sharing one with another seed.
    pub bad_seed_labels: usize,
    /// Ids outside `[0, num_seeds)` other than the unassigned marker.
    pub labels_out_of_range: usize,
}

impl ClusteringReport {
    /// True when no defect was found.
    pub fn is_valid(&self) -> bool {
        self.dangling_links == 0
            && self.cyclic_points == 0
            && self.non_denser_links == 0
            && self.label_mismatches == 0
            && self.seeds_with_link == 0
            && self.bad_seed_labels == 0
            && self.labels_out_of_range == 0
    }

    /// Format a summary of any issues found.
    pub fn summary(&self) -> String {
        if self.is_valid() {
            return "Valid".to_string();
        }

        let checks = [
            (self.dangling_links, "dangling links"),
            (self.cyclic_points, "points on link cycles"),
            (self.non_denser_links, "links to non-denser points"),
            (self.label_mismatches, "label mismatches"),
            (self.seeds_with_link, "seeds with a link"),
            (self.bad_seed_labels, "bad seed labels"),
            (self.labels_out_of_range, "labels out of range"),
        ];
        checks
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, what)| format!("{} {}", count, what))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ClusteringReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ClusteringReport {{ n={}, seeds={}, clusters={}, unassigned={}, {} }}",
            self.num_points,
            self.num_seeds,
            self.num_clusters,
            self.unassigned,
            self.summary()
        )
    }
}

/// Validate the results stored in a clustered host store.
///
/// Fails with [`NotClustered`](crate::ClueError::NotClustered) if the
/// pipeline has not run on `points`.
pub fn validate_clustering<const N: usize>(points: &PointsHost<N>) -> Result<ClusteringReport> {
    let labels = points.cluster_indexes()?;
    let nh = points.nearest_higher();
    let rho = points.rho();
    let is_seed = points.is_seed();
    let n = points.size();

    let mut report = ClusteringReport {
        num_points: n,
        num_seeds: points.n_seeds(),
        ..Default::default()
    };

    let link = |i: usize| -> Option<usize> {
        let j = nh[i];
        (j != NONE && j >= 0 && (j as usize) < n && j as usize != i).then_some(j as usize)
    };

    let mut sizes: FxHashMap<i32, usize> = FxHashMap::default();
    let mut seed_labels: FxHashSet<i32> = FxHashSet::default();
    for i in 0..n {
        let label = labels[i];
        if label == UNASSIGNED {
            report.unassigned += 1;
        } else if label < 0 || label as usize >= report.num_seeds {
            report.labels_out_of_range += 1;
        } else {
            *sizes.entry(label).or_default() += 1;
        }

        if is_seed[i] {
            if nh[i] != NONE {
                report.seeds_with_link += 1;
            }
            if label == UNASSIGNED || !seed_labels.insert(label) {
                report.bad_seed_labels += 1;
            }
            continue;
        }

        if nh[i] == NONE {
            continue;
        }
        let Some(j) = link(i) else {
            report.dangling_links += 1;
            continue;
        };
        if !(rho[j] > rho[i] || (rho[j] == rho[i] && rho[j] > 0.0 && j > i)) {
            report.non_denser_links += 1;
        }
        if labels[j] != label {
            report.label_mismatches += 1;
        }
    }
    report.num_clusters = sizes.len();
    report.largest_cluster = sizes.values().copied().max().unwrap_or(0);
    report.cyclic_points = count_cyclic(n, |i| if is_seed[i] { None } else { link(i) });

    Ok(report)
}

/// Number of points whose parent chain loops instead of reaching a root.
fn count_cyclic(n: usize, parent: impl Fn(usize) -> Option<usize>) -> usize {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state = vec![UNSEEN; n];
    let mut on_cycle = vec![false; n];
    let mut path = Vec::new();

    for start in 0..n {
        if state[start] != UNSEEN {
            continue;
        }
        path.clear();
        let mut cur = Some(start);
        while let Some(i) = cur {
            match state[i] {
                UNSEEN => {
                    state[i] = ON_PATH;
                    path.push(i);
                    cur = parent(i);
                }
                ON_PATH => {
                    // Everything on the path from the first visit of `i` loops.
                    if let Some(pos) = path.iter().position(|&p| p == i) {
                        for &p in &path[pos..] {
                            on_cycle[p] = true;
                        }
                    }
                    cur = None;
                }
                _ => cur = None,
            }
        }
        for &p in &path {
            state[p] = DONE;
        }
    }
    on_cycle.iter().filter(|&&c| c).count()
}
