//! Weighted change graphs between image clusters

/// Bundling, per-image-pair reweighting and merging
pub mod bundle;
/// Edge derivation pipeline and prompt pair selection
pub mod derive;
/// Edge, bundling key and group types
pub mod edges;
