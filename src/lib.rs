//! Analysis engine for text-to-image prompt sessions
//!
//! Diffs consecutive prompts at word level (with move and emphasis-weight
//! detection), traces every word across the session, keeps incremental
//! image layouts visually stable, clusters them, and derives a weighted
//! graph of the word changes leading from one image cluster to another.

#![forbid(unsafe_code)]

/// Session-level orchestration and configuration
pub mod analysis;
/// Change graph edges, bundling and derivation
pub mod graph;
/// Input/output operations and error handling
pub mod io;
/// Layout alignment and clustering
pub mod layout;
/// Word provenance timeline and phrase merging
pub mod lineage;
/// Tokenization and weighted word diffs
pub mod text;

pub use io::error::{AnalysisError, Result};
