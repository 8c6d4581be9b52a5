//! JSON session files and analysis output files

use crate::analysis::session::{Session, SessionAnalysis, SessionPrompt};
use crate::io::configuration::{OUTPUT_SUFFIX, SESSION_EXTENSION};
use crate::io::error::{AnalysisError, Result, file_system};
use crate::layout::procrustes::ProjectionPoint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk form of a session, layouts keyed by image
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    prompts: Vec<SessionPrompt>,
    #[serde(default)]
    image_projection: BTreeMap<String, [f64; 2]>,
    #[serde(default)]
    previous_projection: Option<BTreeMap<String, [f64; 2]>>,
}

impl From<SessionFile> for Session {
    fn from(file: SessionFile) -> Self {
        Self {
            prompts: file.prompts,
            image_projection: to_points(file.image_projection),
            previous_projection: file.previous_projection.map(to_points),
        }
    }
}

impl From<&Session> for SessionFile {
    fn from(session: &Session) -> Self {
        Self {
            prompts: session.prompts.clone(),
            image_projection: to_map(&session.image_projection),
            previous_projection: session.previous_projection.as_deref().map(to_map),
        }
    }
}

/// Parse a session from JSON text
///
/// Layout points come out ordered by key.
///
/// # Errors
///
/// Returns `SessionFormat` if the text is not a valid session document
pub fn parse_session(json: &str) -> Result<Session> {
    let file: SessionFile = serde_json::from_str(json)?;
    Ok(file.into())
}

/// Render a session as pretty-printed JSON
///
/// # Errors
///
/// Returns `SessionFormat` if serialization fails
pub fn session_to_json(session: &Session) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SessionFile::from(session))?)
}

/// Read a session file
///
/// # Errors
///
/// Returns `FileSystem` if the file cannot be read and `SessionFormat` if
/// it is not a valid session document
pub fn read_session(path: &Path) -> Result<Session> {
    let json = fs::read_to_string(path).map_err(file_system(path, "read session"))?;
    let file: SessionFile =
        serde_json::from_str(&json).map_err(|source| AnalysisError::SessionFormat {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.into())
}

/// Write an analysis as pretty-printed JSON
///
/// # Errors
///
/// Returns `SessionFormat` if serialization fails and `FileSystem` if the
/// file cannot be written
pub fn write_analysis(path: &Path, analysis: &SessionAnalysis) -> Result<()> {
    let json =
        serde_json::to_string_pretty(analysis).map_err(|source| AnalysisError::SessionFormat {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, json).map_err(file_system(path, "write analysis"))
}

/// Analysis output path next to a session file: `<stem>_analysis.json`
pub fn output_path(input_path: &Path) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let output_name = format!(
        "{}{}.{}",
        stem.to_string_lossy(),
        OUTPUT_SUFFIX,
        SESSION_EXTENSION
    );

    input_path
        .parent()
        .map_or_else(|| PathBuf::from(&output_name), |parent| parent.join(&output_name))
}

/// Whether a path names an analysis output rather than a session
pub fn is_output_path(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| stem.to_string_lossy().ends_with(OUTPUT_SUFFIX))
}

fn to_points(map: BTreeMap<String, [f64; 2]>) -> Vec<ProjectionPoint> {
    map.into_iter()
        .map(|(key, coordinates)| ProjectionPoint { key, coordinates })
        .collect()
}

fn to_map(points: &[ProjectionPoint]) -> BTreeMap<String, [f64; 2]> {
    points
        .iter()
        .map(|point| (point.key.clone(), point.coordinates))
        .collect()
}
