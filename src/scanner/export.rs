use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use super::MatchSummary;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to create export directory {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize scan results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to write export file {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Serialize `summaries` as pretty JSON keyed by filename and write the
/// document to `path`, creating parent directories as needed.
pub(super) fn write_summaries(
    summaries: &BTreeMap<String, MatchSummary>,
    path: &Path,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    let json = serde_json::to_vec_pretty(summaries)?;
    fs::write(path, &json).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        files = summaries.len(),
        "Exported scan results"
    );
    Ok(())
}
