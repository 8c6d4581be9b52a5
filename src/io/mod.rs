//! Input/output, configuration and error handling

/// Command-line parsing and batch file processing
pub mod cli;
/// Named constants and defaults
pub mod configuration;
/// Error type and constructor helpers
pub mod error;
/// Progress bars for batch processing
pub mod progress;
/// Session and analysis JSON files
pub mod session;
