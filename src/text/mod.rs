//! Prompt text processing: tokenization and weighted word diffs

/// Weighted word diff with move and reweight detection
pub mod differ;
/// Shortest edit script over arbitrary sequences
pub mod myers;
/// Prompt tokenization with sentence weights and emphasis brackets
pub mod tokenizer;
