//! Change graph derivation between image clusters
//!
//! Every compared prompt pair spreads a total weight of one across its diff
//! words and image combinations. Edges are then bundled per cluster pair,
//! rescaled per image pair, merged where they move together and
//! rescaled once more before being summarized into weighted groups.

use crate::graph::bundle::{bundle_edges, merge_edges, update_weight};
use crate::graph::edges::{Change, Edge, EdgeGroup, normalize_edges};
use crate::io::configuration::DEFAULT_IGNORED_EDGE_WORDS;
use crate::io::error::{AnalysisError, Result};
use crate::text::differ::{DiffAction, diff_tokens};
use crate::text::tokenizer::Token;
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Non-keep change between two prompts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffWord {
    /// How the word changed
    pub action: DiffAction,
    /// Changed word
    pub text: String,
}

/// Final edges and their groups, groups by descending weight
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeDerivation {
    /// Merged and rescaled edges
    pub edges: Vec<Edge>,
    /// Bundled edge groups
    pub groups: Vec<EdgeGroup>,
}

/// Derives weighted change graphs from prompt diffs and image clusters
#[derive(Debug, Clone, Default)]
pub struct EdgeDeriver {
    ignored_words: Vec<String>,
    canonical_direction: bool,
}

impl EdgeDeriver {
    /// Create a deriver that keeps every diff word and edge direction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a deriver ignoring the common stop words
    pub fn with_default_ignored_words() -> Self {
        Self::new().ignoring(DEFAULT_IGNORED_EDGE_WORDS)
    }

    /// Ignore the given words when comparing prompts
    #[must_use]
    pub fn ignoring<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_words = words.into_iter().map(Into::into).collect();
        self
    }

    /// Put original edges into canonical direction before bundling
    #[must_use]
    pub const fn canonical_direction(mut self, enabled: bool) -> Self {
        self.canonical_direction = enabled;
        self
    }

    /// Words excluded from diff words
    pub fn ignored_words(&self) -> &[String] {
        &self.ignored_words
    }

    /// Non-keep changes from one prompt to another, ignored words excluded
    pub fn diff_words(&self, source: &[Token], target: &[Token]) -> Vec<DiffWord> {
        diff_tokens(source, target)
            .into_iter()
            .filter(|op| op.action != DiffAction::Keep)
            .filter(|op| !self.ignored_words.iter().any(|word| *word == op.text))
            .map(|op| DiffWord {
                action: op.action,
                text: op.text,
            })
            .collect()
    }

    /// All prompt pairs `(i, j)`, `i < j`, differing by at most `max_distance` words
    pub fn prompt_pairs(&self, prompts: &[Vec<Token>], max_distance: usize) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, source) in prompts.iter().enumerate() {
            for (j, target) in prompts.iter().enumerate().skip(i + 1) {
                if self.diff_words(source, target).len() <= max_distance {
                    pairs.push((i, j));
                }
            }
        }
        debug!("Selected {} prompt pairs within distance {max_distance}", pairs.len());
        pairs
    }

    /// One edge per diff word and image combination of every prompt pair
    ///
    /// Each edge weighs `1 / (|diff words| × |images i| × |images j|)`, so a
    /// pair with any diff word contributes a total weight of one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPrompt` for a pair index outside `prompts` or
    /// `images`, and `UnknownImage` for an image without a cluster
    pub fn generate_original_edges(
        &self,
        prompts: &[Vec<Token>],
        pairs: &[(usize, usize)],
        clusters: &[usize],
        images: &[Vec<usize>],
    ) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();

        for &(i, j) in pairs {
            let (source, source_images) = prompt_with_images(prompts, images, i)?;
            let (target, target_images) = prompt_with_images(prompts, images, j)?;

            let words = self.diff_words(source, target);
            let ratio = source_images.len() * target_images.len();
            if words.is_empty() || ratio == 0 {
                continue;
            }
            let weight = 1.0 / (words.len() * ratio) as f64;

            for word in &words {
                for &src_image in source_images {
                    for &tgt_image in target_images {
                        edges.push(Edge {
                            word: word.text.clone(),
                            action: word.action,
                            src_image,
                            tgt_image,
                            src_cluster: cluster_of(clusters, src_image)?,
                            tgt_cluster: cluster_of(clusters, tgt_image)?,
                            src_prompt: i,
                            tgt_prompt: j,
                            ratio,
                            weight,
                            changes: Vec::new(),
                        });
                    }
                }
            }
        }

        Ok(edges)
    }

    /// Derive edges and edge groups for the given prompt pairs
    ///
    /// `clusters` maps image index to cluster id; `images` maps prompt index
    /// to the indices of the images it produced.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::generate_original_edges`]
    pub fn derive(
        &self,
        prompts: &[Vec<Token>],
        pairs: &[(usize, usize)],
        clusters: &[usize],
        images: &[Vec<usize>],
    ) -> Result<EdgeDerivation> {
        let mut original = self.generate_original_edges(prompts, pairs, clusters, images)?;
        if self.canonical_direction {
            original = normalize_edges(original);
        }

        let bundled = bundle_edges(&original);
        let (updated, _) = update_weight(&original, &bundled);
        let merged = merge_edges(&updated);
        let (edges, weights) = update_weight(&merged, &bundle_edges(&merged));

        let groups = weights
            .sorted()
            .into_iter()
            .map(|(key, weight)| {
                let members: Vec<usize> = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, edge)| edge.key() == *key)
                    .map(|(index, _)| index)
                    .collect();
                let changes: Vec<Change> = members
                    .first()
                    .and_then(|&index| edges.get(index))
                    .map(Edge::flattened_changes)
                    .unwrap_or_default();
                EdgeGroup {
                    word: key.word.clone(),
                    action: key.action,
                    src_cluster: key.src_cluster,
                    tgt_cluster: key.tgt_cluster,
                    weight,
                    changes,
                    members,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Derived {} edges in {} groups from {} original edges",
            edges.len(),
            groups.len(),
            original.len()
        );
        Ok(EdgeDerivation { edges, groups })
    }

    /// Count of inserted, removed and moved words between every prompt pair
    ///
    /// Entry `(i, j)` diffs prompt `i` into prompt `j`; ignored words are
    /// not excluded.
    pub fn edit_distance_matrix(prompts: &[Vec<Token>]) -> Array2<usize> {
        Array2::from_shape_fn((prompts.len(), prompts.len()), |(i, j)| {
            match (prompts.get(i), prompts.get(j)) {
                (Some(source), Some(target)) if i != j => diff_tokens(source, target)
                    .iter()
                    .filter(|op| op.action.is_edit())
                    .count(),
                _ => 0,
            }
        })
    }
}

/// Image indices ordered by total weight of the edges touching them
///
/// Every image `0..image_count` is ranked; ties keep ascending index.
pub fn rank_images(edges: &[Edge], image_count: usize) -> Vec<usize> {
    let mut scores = vec![0.0_f64; image_count];
    for edge in edges {
        if let Some(score) = scores.get_mut(edge.src_image) {
            *score += edge.weight;
        }
        if edge.tgt_image != edge.src_image
            && let Some(score) = scores.get_mut(edge.tgt_image)
        {
            *score += edge.weight;
        }
    }

    let mut ranking: Vec<usize> = (0..image_count).collect();
    ranking.sort_by(|&a, &b| {
        let score_a = scores.get(a).copied().unwrap_or(0.0);
        let score_b = scores.get(b).copied().unwrap_or(0.0);
        score_b.total_cmp(&score_a)
    });
    ranking
}

fn prompt_with_images<'a>(
    prompts: &'a [Vec<Token>],
    images: &'a [Vec<usize>],
    index: usize,
) -> Result<(&'a [Token], &'a [usize])> {
    let unknown = || AnalysisError::UnknownPrompt {
        index,
        prompt_count: prompts.len().min(images.len()),
    };
    let tokens = prompts.get(index).ok_or_else(unknown)?;
    let owned = images.get(index).ok_or_else(unknown)?;
    Ok((tokens, owned))
}

fn cluster_of(clusters: &[usize], image: usize) -> Result<usize> {
    clusters
        .get(image)
        .copied()
        .ok_or(AnalysisError::UnknownImage {
            image,
            image_count: clusters.len(),
        })
}
