//! Word provenance across a prompt session

/// Session timeline construction from consecutive diffs
pub mod builder;
/// Fixpoint merging of edit-consistent word runs into phrases
pub mod phrases;
/// Word node arena and provenance links
pub mod timeline;
