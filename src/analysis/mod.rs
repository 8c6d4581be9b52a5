//! Session-level orchestration of the analysis views

/// Runtime analysis parameters
pub mod config;
/// Timeline, layout and change graph of one session
pub mod session;
