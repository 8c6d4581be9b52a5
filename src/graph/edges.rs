//! Image-to-image change edges and their bundled aggregates

use crate::text::differ::DiffAction;
use serde::{Deserialize, Serialize};

/// One word-level change carried by an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    /// Changed word or phrase
    pub word: String,
    /// How the word changed
    pub action: DiffAction,
}

/// A weighted change from an image of one prompt to an image of another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Changed word, or the space-joined words of a merged edge
    pub word: String,
    /// Action of the change (of the first change for merged edges)
    pub action: DiffAction,
    /// Image the change starts from
    pub src_image: usize,
    /// Image the change leads to
    pub tgt_image: usize,
    /// Cluster of the source image
    pub src_cluster: usize,
    /// Cluster of the target image
    pub tgt_cluster: usize,
    /// Prompt that produced the source image
    pub src_prompt: usize,
    /// Prompt that produced the target image
    pub tgt_prompt: usize,
    /// Number of image combinations of the prompt pair
    pub ratio: usize,
    /// Edge weight
    pub weight: f64,
    /// Constituent changes of a merged edge, empty for a single change
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<Change>,
}

impl Edge {
    /// Bundling key of the edge
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            word: self.word.clone(),
            action: self.action,
            src_cluster: self.src_cluster,
            tgt_cluster: self.tgt_cluster,
        }
    }

    /// Number of word changes the edge stands for
    pub fn change_count(&self) -> usize {
        self.changes.len().max(1)
    }

    /// Weight per constituent change
    pub fn unit_weight(&self) -> f64 {
        self.weight / self.change_count() as f64
    }

    /// Constituent changes, the edge's own word for a single change
    pub fn flattened_changes(&self) -> Vec<Change> {
        if self.changes.is_empty() {
            vec![Change {
                word: self.word.clone(),
                action: self.action,
            }]
        } else {
            self.changes.clone()
        }
    }

    /// The same change seen from target to source
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            action: self.action.reversed(),
            src_image: self.tgt_image,
            tgt_image: self.src_image,
            src_cluster: self.tgt_cluster,
            tgt_cluster: self.src_cluster,
            src_prompt: self.tgt_prompt,
            tgt_prompt: self.src_prompt,
            changes: self
                .changes
                .into_iter()
                .map(|change| Change {
                    word: change.word,
                    action: change.action.reversed(),
                })
                .collect(),
            ..self
        }
    }

    /// Whether the edge points against canonical direction
    ///
    /// Within one cluster edges run from the earlier prompt to the later;
    /// across clusters from the lower cluster id to the higher.
    pub const fn is_backwards(&self) -> bool {
        if self.src_cluster == self.tgt_cluster {
            self.src_prompt > self.tgt_prompt
        } else {
            self.src_cluster > self.tgt_cluster
        }
    }
}

/// Aggregation key of edges: `(word, action, src_cluster, tgt_cluster)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Changed word or phrase
    pub word: String,
    /// Action of the change
    pub action: DiffAction,
    /// Source cluster
    pub src_cluster: usize,
    /// Target cluster
    pub tgt_cluster: usize,
}

/// Edges sharing one bundling key, summarized for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeGroup {
    /// Changed word or phrase
    pub word: String,
    /// Action of the change
    pub action: DiffAction,
    /// Source cluster
    pub src_cluster: usize,
    /// Target cluster
    pub tgt_cluster: usize,
    /// Bundled weight
    pub weight: f64,
    /// Constituent changes of the first edge with this key
    pub changes: Vec<Change>,
    /// Indices of the edges with this key
    pub members: Vec<usize>,
}

/// Put every edge into canonical direction
///
/// Backwards edges are reversed: endpoints, clusters and prompts swap and
/// the action flips (`insert`/`remove`, `reweight_up`/`reweight_down`).
pub fn normalize_edges(edges: Vec<Edge>) -> Vec<Edge> {
    edges
        .into_iter()
        .map(|edge| if edge.is_backwards() { edge.reversed() } else { edge })
        .collect()
}
