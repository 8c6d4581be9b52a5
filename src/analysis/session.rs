//! End-to-end analysis of one prompt session
//!
//! Runs the timeline, layout and change graph views over the same session
//! and gathers their results into one serializable value.

use crate::analysis::config::AnalysisConfig;
use crate::graph::derive::{EdgeDeriver, rank_images};
use crate::graph::edges::{Edge, EdgeGroup};
use crate::io::error::{AnalysisError, Result};
use crate::layout::cluster::cluster_keyed;
use crate::layout::procrustes::{ProjectionPoint, align};
use crate::lineage::builder::LineageBuilder;
use crate::lineage::phrases::PhraseMerger;
use crate::lineage::timeline::ResolvedPrompt;
use crate::text::differ::WeightedDiffer;
use crate::text::tokenizer::{Token, Tokenizer};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One prompt of a session with the images it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPrompt {
    /// Prompt text
    pub prompt: String,
    /// Keys of the produced images
    #[serde(default)]
    pub images: Vec<String>,
}

/// A prompt session with its image layouts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Prompts in session order
    pub prompts: Vec<SessionPrompt>,
    /// Current 2-D layout of the images
    pub image_projection: Vec<ProjectionPoint>,
    /// Layout shown before this analysis, if any
    pub previous_projection: Option<Vec<ProjectionPoint>>,
}

impl Session {
    /// Distinct image keys in first-appearance order
    pub fn image_keys(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.prompts
            .iter()
            .flat_map(|p| &p.images)
            .filter(|image| seen.insert(image.as_str()))
            .cloned()
            .collect()
    }

    /// Image indices produced by each prompt, indexed like [`Self::image_keys`]
    pub fn image_indices(&self) -> Vec<Vec<usize>> {
        let keys = self.image_keys();
        let index: HashMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();

        self.prompts
            .iter()
            .map(|prompt| {
                prompt
                    .images
                    .iter()
                    .filter_map(|image| index.get(image.as_str()).copied())
                    .collect()
            })
            .collect()
    }
}

/// Every view of one analyzed session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    /// Phrase-merged word timeline
    pub timeline: Vec<ResolvedPrompt>,
    /// Aligned image layout
    pub layout: Vec<ProjectionPoint>,
    /// Cluster id per image key
    pub clusters: BTreeMap<String, usize>,
    /// Change graph edges between images
    pub edges: Vec<Edge>,
    /// Edge groups by descending weight
    pub edge_groups: Vec<EdgeGroup>,
    /// Image keys by descending edge weight
    pub image_ranking: Vec<String>,
}

/// Runs all analysis views over sessions with one configuration
#[derive(Debug, Clone)]
pub struct SessionAnalyzer {
    config: AnalysisConfig,
    builder: LineageBuilder,
    merger: PhraseMerger,
    deriver: EdgeDeriver,
}

impl SessionAnalyzer {
    /// Create an analyzer for the given configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the configuration fails validation
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let tokenizer = Tokenizer::with_symbols(config.symbols.iter().cloned());
        let builder = LineageBuilder::with_differ(WeightedDiffer::with_tokenizer(tokenizer));
        let merger = PhraseMerger::with_symbols(config.symbols.iter().cloned());
        let deriver = EdgeDeriver::new()
            .ignoring(config.ignored_words.iter().cloned())
            .canonical_direction(config.canonical_direction);

        Ok(Self {
            config,
            builder,
            merger,
            deriver,
        })
    }

    /// Configuration in use
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one session
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A prompt is malformed
    /// - An image of a prompt has no point in the layout
    pub fn analyze(&self, session: &Session) -> Result<SessionAnalysis> {
        let texts: Vec<&str> = session.prompts.iter().map(|p| p.prompt.as_str()).collect();
        let timeline = self.merger.merge(&self.builder.build(&texts)?);

        let layout = match &session.previous_projection {
            Some(previous) => align(previous, &session.image_projection),
            None => session.image_projection.clone(),
        };
        let assignment = cluster_keyed(&layout, self.config.cluster_threshold)?;

        let keys = session.image_keys();
        let image_clusters = keys
            .iter()
            .enumerate()
            .map(|(image, key)| {
                assignment
                    .cluster_of(key)
                    .ok_or(AnalysisError::UnknownImage {
                        image,
                        image_count: assignment.assignments.len(),
                    })
            })
            .collect::<Result<Vec<usize>>>()?;

        let prompt_tokens: Vec<Vec<Token>> =
            (0..timeline.len()).map(|i| timeline.prompt_tokens(i)).collect();
        let pairs = self
            .deriver
            .prompt_pairs(&prompt_tokens, self.config.max_pair_distance);
        let derivation = self.deriver.derive(
            &prompt_tokens,
            &pairs,
            &image_clusters,
            &session.image_indices(),
        )?;
        debug!(
            "Layout has {} points for {} session images",
            layout.len(),
            keys.len()
        );

        let image_ranking = rank_images(&derivation.edges, keys.len())
            .into_iter()
            .filter_map(|image| keys.get(image).cloned())
            .collect();

        info!(
            "Analyzed {} prompts, {} images in {} clusters, {} edge groups",
            timeline.len(),
            keys.len(),
            assignment.cluster_count(),
            derivation.groups.len()
        );

        Ok(SessionAnalysis {
            timeline: timeline.resolve(),
            layout,
            clusters: assignment.assignments.into_iter().collect(),
            edges: derivation.edges,
            edge_groups: derivation.groups,
            image_ranking,
        })
    }
}
