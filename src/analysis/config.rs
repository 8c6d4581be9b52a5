//! Runtime parameters of a session analysis

use crate::io::configuration::{
    DEFAULT_CLUSTER_THRESHOLD, DEFAULT_IGNORED_EDGE_WORDS, DEFAULT_MAX_PAIR_DISTANCE,
    DEFAULT_SYMBOLS,
};
use crate::io::error::{Result, invalid_parameter};

/// Parameters controlling tokenization, clustering and edge derivation
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    /// Punctuation split out as standalone tokens
    pub symbols: Vec<String>,
    /// Ward distance at which the layout dendrogram is cut
    pub cluster_threshold: f64,
    /// Maximum number of diff words for a prompt pair to be compared
    pub max_pair_distance: usize,
    /// Words left out of edge derivation
    pub ignored_words: Vec<String>,
    /// Whether edges are put into canonical direction before bundling
    pub canonical_direction: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect(),
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
            max_pair_distance: DEFAULT_MAX_PAIR_DISTANCE,
            ignored_words: DEFAULT_IGNORED_EDGE_WORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            canonical_direction: false,
        }
    }
}

impl AnalysisConfig {
    /// Check parameter ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the cluster threshold is negative or
    /// not finite, or a symbol is empty
    pub fn validate(&self) -> Result<()> {
        if !self.cluster_threshold.is_finite() || self.cluster_threshold < 0.0 {
            return Err(invalid_parameter(
                "cluster_threshold",
                &self.cluster_threshold,
                &"must be a finite non-negative distance",
            ));
        }
        if self.symbols.iter().any(String::is_empty) {
            return Err(invalid_parameter(
                "symbols",
                &format!("{:?}", self.symbols),
                &"symbols must not be empty strings",
            ));
        }
        Ok(())
    }
}
