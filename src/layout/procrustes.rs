//! Procrustes alignment keeping incremental 2-D layouts visually stable
//!
//! A freshly computed layout is rotated, reflected and scaled onto the
//! previous one using the points both layouts share as anchors. The solved
//! transform is then applied to every point of the new layout and the
//! result is min-max normalized per axis.

use log::debug;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A keyed point of a 2-D layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    /// Image or prompt key
    pub key: String,
    /// Layout coordinates
    pub coordinates: [f64; 2],
}

impl ProjectionPoint {
    /// Create a point from its key and coordinates
    pub fn new(key: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            key: key.into(),
            coordinates: [x, y],
        }
    }
}

/// Similarity transform solved from anchor points
///
/// Maps a target point `p` to `s · R · (p + offset) / norm`.
#[derive(Debug, Clone)]
pub struct Alignment {
    offset: Array1<f64>,
    norm: f64,
    rotation: Array2<f64>,
    scale: f64,
}

impl Alignment {
    /// Solve the transform taking target anchors onto reference anchors
    ///
    /// Duplicate keys within one set are averaged first. Returns `None` when
    /// fewer than two keys are shared or the anchors are degenerate.
    pub fn solve(reference: &[ProjectionPoint], target: &[ProjectionPoint]) -> Option<Self> {
        let reference = average_by_key(reference);
        let target = average_by_key(target);

        let target_lookup: HashMap<&str, [f64; 2]> = target
            .iter()
            .map(|(key, point)| (key.as_str(), *point))
            .collect();
        let anchors: Vec<([f64; 2], [f64; 2])> = reference
            .iter()
            .filter_map(|(key, point)| target_lookup.get(key.as_str()).map(|t| (*point, *t)))
            .collect();

        if anchors.len() < 2 {
            debug!("Only {} shared keys, skipping alignment", anchors.len());
            return None;
        }

        let reference_matrix = Array2::from_shape_fn((anchors.len(), 2), |(i, j)| {
            anchors.get(i).and_then(|(r, _)| r.get(j)).copied().unwrap_or(0.0)
        });
        let target_matrix = Array2::from_shape_fn((anchors.len(), 2), |(i, j)| {
            anchors.get(i).and_then(|(_, t)| t.get(j)).copied().unwrap_or(0.0)
        });

        let (reference_std, _, _) = standardize(&reference_matrix)?;
        let (target_std, offset, norm) = standardize(&target_matrix)?;

        let covariance = reference_std.t().dot(&target_std);
        let Some((rotation, scale)) = orthogonal_procrustes(&covariance) else {
            debug!("Degenerate anchor covariance, skipping alignment");
            return None;
        };

        Some(Self {
            offset,
            norm,
            rotation,
            scale,
        })
    }

    /// Orthogonal part of the transform (rotation or reflection)
    pub fn rotation(&self) -> [[f64; 2]; 2] {
        [
            [entry(&self.rotation, 0, 0), entry(&self.rotation, 0, 1)],
            [entry(&self.rotation, 1, 0), entry(&self.rotation, 1, 1)],
        ]
    }

    /// Uniform scale of the transform
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Transform one target-space point
    pub fn apply(&self, point: [f64; 2]) -> [f64; 2] {
        let [x, y] = point;
        let px = (x + self.offset.get(0).copied().unwrap_or(0.0)) / self.norm;
        let py = (y + self.offset.get(1).copied().unwrap_or(0.0)) / self.norm;
        let r = self.rotation();

        let [[r00, r01], [r10, r11]] = r;
        [
            r00.mul_add(px, r01 * py) * self.scale,
            r10.mul_add(px, r11 * py) * self.scale,
        ]
    }
}

/// Align `target` onto `reference` and normalize it into the unit square
///
/// Returns `target` unchanged when fewer than two keys are shared or the
/// shared points are degenerate. Otherwise every target point, duplicates
/// included, is transformed and the result is min-max normalized per axis.
pub fn align(reference: &[ProjectionPoint], target: &[ProjectionPoint]) -> Vec<ProjectionPoint> {
    let Some(alignment) = Alignment::solve(reference, target) else {
        return target.to_vec();
    };

    let mut aligned: Vec<ProjectionPoint> = target
        .iter()
        .map(|point| ProjectionPoint {
            key: point.key.clone(),
            coordinates: alignment.apply(point.coordinates),
        })
        .collect();
    min_max_normalize(&mut aligned);
    aligned
}

/// Rescale each axis independently into `[0, 1]`
///
/// An axis on which all points coincide is placed at `0.5`.
pub fn min_max_normalize(points: &mut [ProjectionPoint]) {
    for axis in 0..2 {
        let values = points
            .iter()
            .filter_map(|p| p.coordinates.get(axis).copied());
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let range = max - min;

        for point in points.iter_mut() {
            if let Some(value) = point.coordinates.get_mut(axis) {
                *value = if range > 0.0 {
                    (*value - min) / range
                } else {
                    0.5
                };
            }
        }
    }
}

/// Merge points sharing a key by averaging, in first-appearance order
fn average_by_key(points: &[ProjectionPoint]) -> Vec<(String, [f64; 2])> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<&str, ([f64; 2], usize)> = HashMap::new();

    for point in points {
        let entry = sums.entry(point.key.as_str()).or_insert_with(|| {
            order.push(point.key.clone());
            ([0.0, 0.0], 0)
        });
        entry.0[0] += point.coordinates[0];
        entry.0[1] += point.coordinates[1];
        entry.1 += 1;
    }

    order
        .into_iter()
        .filter_map(|key| {
            let ([sx, sy], count) = sums.get(key.as_str()).copied()?;
            let count = count as f64;
            Some((key, [sx / count, sy / count]))
        })
        .collect()
}

/// Center a point matrix and scale it to unit Frobenius norm
///
/// Returns the standardized matrix, the translation that centered it and
/// the norm it was divided by.
fn standardize(matrix: &Array2<f64>) -> Option<(Array2<f64>, Array1<f64>, f64)> {
    let mean = matrix.mean_axis(Axis(0))?;
    let centered = matrix - &mean;
    let norm = centered.mapv(|v| v * v).sum().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    Some((centered / norm, -mean, norm))
}

/// Nearest orthogonal matrix to a 2×2 matrix and the sum of its singular values
///
/// Splits `m` into a scaled rotation plus a scaled reflection; whichever
/// part dominates is the polar factor.
fn orthogonal_procrustes(m: &Array2<f64>) -> Option<(Array2<f64>, f64)> {
    let (a, b, c, d) = (entry(m, 0, 0), entry(m, 0, 1), entry(m, 1, 0), entry(m, 1, 1));

    let e = (a + d) / 2.0;
    let f = (a - d) / 2.0;
    let g = (c + b) / 2.0;
    let h = (c - b) / 2.0;

    let rotation_part = e.hypot(h);
    let reflection_part = f.hypot(g);
    if rotation_part == 0.0 && reflection_part == 0.0 {
        return None;
    }

    let orthogonal = if rotation_part >= reflection_part {
        ndarray::array![[e, -h], [h, e]] / rotation_part
    } else {
        ndarray::array![[f, g], [g, -f]] / reflection_part
    };

    Some((orthogonal, 2.0 * rotation_part.max(reflection_part)))
}

fn entry(m: &Array2<f64>, row: usize, col: usize) -> f64 {
    m.get([row, col]).copied().unwrap_or(0.0)
}
