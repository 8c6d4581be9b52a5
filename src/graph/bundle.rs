//! Bundling, reweighting and merging of edges
//!
//! All groupings keep first-appearance order so results are reproducible.

use crate::graph::edges::{Change, Edge, EdgeKey};
use crate::io::configuration::EDGE_WEIGHT_DECIMALS;
use std::collections::HashMap;
use std::hash::Hash;

/// Summed edge weight per bundling key, in first-appearance order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeBundle {
    entries: Vec<(EdgeKey, f64)>,
    index: HashMap<EdgeKey, usize>,
}

impl EdgeBundle {
    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no edge was bundled
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bundled weight of a key, zero when absent
    pub fn weight(&self, key: &EdgeKey) -> f64 {
        self.index
            .get(key)
            .and_then(|&i| self.entries.get(i))
            .map_or(0.0, |(_, weight)| *weight)
    }

    /// Keys and weights in first-appearance order
    pub fn iter(&self) -> impl Iterator<Item = (&EdgeKey, f64)> + '_ {
        self.entries.iter().map(|(key, weight)| (key, *weight))
    }

    /// Keys and weights by descending weight, ties in first-appearance order
    pub fn sorted(&self) -> Vec<(&EdgeKey, f64)> {
        let mut sorted: Vec<(&EdgeKey, f64)> = self.iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }

    fn add(&mut self, key: EdgeKey, weight: f64) {
        if let Some(entry) = self.index.get(&key).and_then(|&i| self.entries.get_mut(i)) {
            entry.1 += weight;
            return;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, weight));
    }
}

/// Sum edge weights per `(word, action, src_cluster, tgt_cluster)`
pub fn bundle_edges(edges: &[Edge]) -> EdgeBundle {
    let mut bundle = EdgeBundle::default();
    for edge in edges {
        bundle.add(edge.key(), edge.weight);
    }
    bundle
}

/// Rescale edges per image pair by their bundled weights, then re-bundle
///
/// Within each `(src_image, tgt_image)` group an edge gets
/// `bundled(key) / (Σ bundled(keys of the group) × ratio)`. Edges come out
/// grouped by image pair in first-appearance order.
pub fn update_weight(edges: &[Edge], bundle: &EdgeBundle) -> (Vec<Edge>, EdgeBundle) {
    let groups = group_by(edges, |edge| (edge.src_image, edge.tgt_image));
    let mut updated = Vec::with_capacity(edges.len());

    for members in groups {
        let group_weight: f64 = members.iter().map(|edge| bundle.weight(&edge.key())).sum();
        for edge in members {
            let denominator = group_weight * edge.ratio as f64;
            let weight = if denominator > 0.0 {
                bundle.weight(&edge.key()) / denominator
            } else {
                0.0
            };
            updated.push(Edge {
                weight,
                ..edge.clone()
            });
        }
    }

    let rebundled = bundle_edges(&updated);
    (updated, rebundled)
}

/// Merge edges of one image pair that carry equal per-change weight
///
/// Single-change edges are grouped by `(src_image, tgt_image, unit weight
/// rounded)`. Each group becomes one edge listing every constituent change,
/// with the space-joined words, the first member's action, and weight
/// `min(first unit weight × change count, 1)`. Edges that already list
/// changes pass through unchanged, so merging twice is merging once.
pub fn merge_edges(edges: &[Edge]) -> Vec<Edge> {
    let scale = 10_f64.powi(EDGE_WEIGHT_DECIMALS);
    let indexed: Vec<(usize, &Edge)> = edges.iter().enumerate().collect();
    let groups = group_by(&indexed, |&(position, edge)| {
        let merged = (!edge.changes.is_empty()).then_some(position);
        let rounded = (edge.unit_weight() * scale).round() as i64;
        (edge.src_image, edge.tgt_image, rounded, merged)
    });

    groups
        .into_iter()
        .filter_map(|members| {
            let &&(_, first) = members.first()?;
            if !first.changes.is_empty() {
                return Some(first.clone());
            }

            let changes: Vec<Change> = members
                .iter()
                .flat_map(|(_, edge)| edge.flattened_changes())
                .collect();
            let word = changes
                .iter()
                .map(|change| change.word.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let weight = (first.unit_weight() * changes.len() as f64).min(1.0);

            Some(Edge {
                word,
                action: first.action,
                weight,
                changes,
                ..first.clone()
            })
        })
        .collect()
}

/// Group items by key, groups and members in first-appearance order
fn group_by<'a, T, K, F>(items: &'a [T], key_of: F) -> Vec<Vec<&'a T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<Vec<&'a T>> = Vec::new();

    for item in items {
        let slot = *index.entry(key_of(item)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        if let Some(group) = groups.get_mut(slot) {
            group.push(item);
        }
    }

    groups
}
