//! Error types and constructor helpers for analysis operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all analysis operations
#[derive(Debug)]
pub enum AnalysisError {
    /// Prompt text violates the emphasis or weight-suffix syntax
    ///
    /// Occurs when:
    /// - Brackets are unbalanced or closed by the wrong kind
    /// - A sentence carries more than one `:` or a non-numeric weight
    MalformedPromptSyntax {
        /// Offending prompt or sentence text
        prompt: String,
        /// Description of what's wrong with the syntax
        reason: String,
    },

    /// Analysis parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Prompt index exceeds the session length
    UnknownPrompt {
        /// The invalid prompt index
        index: usize,
        /// Number of prompts in the session
        prompt_count: usize,
    },

    /// Image index has no cluster assignment
    UnknownImage {
        /// The invalid image index
        image: usize,
        /// Number of images with a cluster assignment
        image_count: usize,
    },

    /// Session file could not be parsed or serialized
    SessionFormat {
        /// Path of the session file
        path: PathBuf,
        /// Underlying JSON error
        source: serde_json::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPromptSyntax { prompt, reason } => {
                write!(f, "Malformed prompt syntax in '{prompt}': {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::UnknownPrompt {
                index,
                prompt_count,
            } => {
                write!(
                    f,
                    "Prompt index {index} is out of bounds (session has {prompt_count} prompts)"
                )
            }
            Self::UnknownImage { image, image_count } => {
                write!(
                    f,
                    "Image index {image} has no cluster assignment ({image_count} images assigned)"
                )
            }
            Self::SessionFormat { path, source } => {
                write!(f, "Invalid session file '{}': {source}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SessionFormat { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for analysis results
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        Self::SessionFormat {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> AnalysisError {
    AnalysisError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a malformed prompt error
pub fn malformed_prompt(prompt: &str, reason: &impl ToString) -> AnalysisError {
    AnalysisError::MalformedPromptSyntax {
        prompt: prompt.to_string(),
        reason: reason.to_string(),
    }
}

/// Attach a path and operation to a file system error
pub fn file_system(
    path: impl Into<PathBuf>,
    operation: &'static str,
) -> impl FnOnce(std::io::Error) -> AnalysisError {
    let path = path.into();
    move |source| AnalysisError::FileSystem {
        path,
        operation,
        source,
    }
}
