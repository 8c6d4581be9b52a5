//! Stable 2-D layouts of session images

/// Ward clustering and threshold cuts
pub mod cluster;
/// Procrustes alignment onto a previous layout
pub mod procrustes;
