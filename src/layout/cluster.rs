//! Ward agglomerative clustering of 2-D layout points
//!
//! Builds the full Ward dendrogram with Lance-Williams distance updates and
//! flattens it at a distance threshold: every maximal subtree whose merge
//! height does not exceed the threshold becomes one cluster.

use crate::io::error::{Result, invalid_parameter};
use crate::layout::procrustes::ProjectionPoint;
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One agglomeration step of a dendrogram
///
/// Leaves are numbered `0..n`; the cluster created by step `s` is `n + s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Smaller id of the two merged clusters
    pub left: usize,
    /// Larger id of the two merged clusters
    pub right: usize,
    /// Ward distance between the merged clusters
    pub height: f64,
    /// Number of leaves in the new cluster
    pub size: usize,
}

/// Complete Ward merge tree over a point set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    /// Build the Ward dendrogram of a point set
    ///
    /// Ties between equally close pairs go to the pair with the lowest
    /// indices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if any coordinate is not finite
    pub fn ward(points: &[[f64; 2]]) -> Result<Self> {
        if let Some(bad) = points.iter().position(|p| p.iter().any(|v| !v.is_finite())) {
            return Err(invalid_parameter(
                "points",
                &format!("point {bad}"),
                &"coordinates must be finite",
            ));
        }

        let n = points.len();
        let mut distances = Array2::from_shape_fn((n, n), |(i, j)| {
            match (points.get(i), points.get(j)) {
                (Some([ax, ay]), Some([bx, by])) => (ax - bx).hypot(ay - by),
                _ => 0.0,
            }
        });

        // Slot i holds (cluster id, size) while active
        let mut active: Vec<Option<(usize, usize)>> = (0..n).map(|i| Some((i, 1))).collect();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        for step in 0..n.saturating_sub(1) {
            let Some((i, j, height)) = closest_pair(&distances, &active) else {
                break;
            };
            let (Some((id_i, size_i)), Some((id_j, size_j))) = (
                active.get(i).copied().flatten(),
                active.get(j).copied().flatten(),
            ) else {
                break;
            };

            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                let Some((_, size_k)) = active.get(k).copied().flatten() else {
                    continue;
                };
                let d_ki = distances.get([k, i]).copied().unwrap_or(0.0);
                let d_kj = distances.get([k, j]).copied().unwrap_or(0.0);
                let updated = ward_update(
                    (d_ki, d_kj, height),
                    (size_i as f64, size_j as f64, size_k as f64),
                );
                if let Some(d) = distances.get_mut([i, k]) {
                    *d = updated;
                }
                if let Some(d) = distances.get_mut([k, i]) {
                    *d = updated;
                }
            }

            let size = size_i + size_j;
            merges.push(Merge {
                left: id_i.min(id_j),
                right: id_i.max(id_j),
                height,
                size,
            });
            if let Some(slot) = active.get_mut(i) {
                *slot = Some((n + step, size));
            }
            if let Some(slot) = active.get_mut(j) {
                *slot = None;
            }
        }

        Ok(Self { leaves: n, merges })
    }

    /// Number of clustered points
    pub const fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Merge steps in agglomeration order
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Flatten the tree into cluster ids, one per point, numbered from 1
    ///
    /// Nodes are visited depth first, left before right, from the root. The
    /// first node reached whose subtree never merges above `threshold`
    /// claims the next id for all its leaves.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `threshold` is negative or not finite
    pub fn cut(&self, threshold: f64) -> Result<Vec<usize>> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid_parameter(
                "threshold",
                &threshold,
                &"must be a finite non-negative distance",
            ));
        }

        let n = self.leaves;
        let mut labels = vec![0; n];
        if n == 0 {
            return Ok(labels);
        }
        if self.merges.is_empty() {
            labels.fill(1);
            return Ok(labels);
        }

        let peaks = self.subtree_peaks();
        let mut next_id = 0;
        let mut stack = vec![n + self.merges.len() - 1];

        while let Some(node) = stack.pop() {
            let Some(merge) = node.checked_sub(n).and_then(|s| self.merges.get(s)) else {
                next_id += 1;
                if let Some(label) = labels.get_mut(node) {
                    *label = next_id;
                }
                continue;
            };

            let peak = node
                .checked_sub(n)
                .and_then(|s| peaks.get(s))
                .copied()
                .unwrap_or(merge.height);
            if peak <= threshold {
                next_id += 1;
                for leaf in self.leaves_under(node) {
                    if let Some(label) = labels.get_mut(leaf) {
                        *label = next_id;
                    }
                }
            } else {
                stack.push(merge.right);
                stack.push(merge.left);
            }
        }

        Ok(labels)
    }

    /// Highest merge height within each merge's subtree
    fn subtree_peaks(&self) -> Vec<f64> {
        let n = self.leaves;
        let mut peaks: Vec<f64> = Vec::with_capacity(self.merges.len());
        for merge in &self.merges {
            let child_peak = |child: usize| {
                child
                    .checked_sub(n)
                    .and_then(|s| peaks.get(s))
                    .copied()
                    .unwrap_or(f64::NEG_INFINITY)
            };
            let peak = merge
                .height
                .max(child_peak(merge.left))
                .max(child_peak(merge.right));
            peaks.push(peak);
        }
        peaks
    }

    fn leaves_under(&self, node: usize) -> Vec<usize> {
        let n = self.leaves;
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match current.checked_sub(n).and_then(|s| self.merges.get(s)) {
                Some(merge) => {
                    stack.push(merge.right);
                    stack.push(merge.left);
                }
                None => leaves.push(current),
            }
        }
        leaves
    }
}

/// Cluster ids of a keyed layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// `(key, cluster id)` in input order
    pub assignments: Vec<(String, usize)>,
}

impl ClusterAssignment {
    /// Cluster of the first point with the given key
    pub fn cluster_of(&self, key: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, cluster)| *cluster)
    }

    /// Number of distinct clusters
    pub fn cluster_count(&self) -> usize {
        self.assignments
            .iter()
            .map(|(_, cluster)| *cluster)
            .max()
            .unwrap_or(0)
    }

    /// Cluster ids in input order
    pub fn ids(&self) -> Vec<usize> {
        self.assignments.iter().map(|(_, cluster)| *cluster).collect()
    }
}

/// Ward-cluster points and cut the tree at `threshold`
///
/// Returns one id per point, numbered from 1. A single point is cluster 1;
/// no points give no ids.
///
/// # Errors
///
/// Returns `InvalidParameter` for non-finite coordinates or a negative or
/// non-finite threshold
pub fn cluster(points: &[[f64; 2]], threshold: f64) -> Result<Vec<usize>> {
    let labels = Dendrogram::ward(points)?.cut(threshold)?;
    debug!(
        "Clustered {} points into {} clusters at threshold {threshold}",
        points.len(),
        labels.iter().max().copied().unwrap_or(0)
    );
    Ok(labels)
}

/// Cluster keyed layout points, keeping keys alongside their ids
///
/// # Errors
///
/// Same conditions as [`cluster`]
pub fn cluster_keyed(points: &[ProjectionPoint], threshold: f64) -> Result<ClusterAssignment> {
    let coordinates: Vec<[f64; 2]> = points.iter().map(|p| p.coordinates).collect();
    let labels = cluster(&coordinates, threshold)?;
    Ok(ClusterAssignment {
        assignments: points
            .iter()
            .zip(labels)
            .map(|(point, label)| (point.key.clone(), label))
            .collect(),
    })
}

/// Lowest-index active pair at minimum distance
fn closest_pair(
    distances: &Array2<f64>,
    active: &[Option<(usize, usize)>],
) -> Option<(usize, usize, f64)> {
    let live: Vec<usize> = (0..active.len())
        .filter(|&i| active.get(i).is_some_and(Option::is_some))
        .collect();

    let mut best: Option<(usize, usize, f64)> = None;
    for (a, &i) in live.iter().enumerate() {
        for &j in live.iter().skip(a + 1) {
            let d = distances.get([i, j]).copied().unwrap_or(f64::INFINITY);
            if best.is_none_or(|(_, _, current)| d < current) {
                best = Some((i, j, d));
            }
        }
    }
    best
}

/// Lance-Williams update of the Ward distance from `k` to the merge of `i` and `j`
fn ward_update(
    (d_ki, d_kj, d_ij): (f64, f64, f64),
    (n_i, n_j, n_k): (f64, f64, f64),
) -> f64 {
    let numerator = (n_k + n_j).mul_add(
        d_kj * d_kj,
        (n_k + n_i).mul_add(d_ki * d_ki, -(n_k * d_ij * d_ij)),
    );
    (numerator / (n_i + n_j + n_k)).max(0.0).sqrt()
}
