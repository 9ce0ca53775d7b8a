use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::size::pretty_size;

/// Listing entry for one file in the downloads folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Entry name (not full path).
    pub file: String,
    /// Human-readable size, e.g. `"1.54 kB"`.
    pub size: String,
    /// Creation time, or modification time where creation is unavailable.
    #[serde(serialize_with = "rfc3339_millis")]
    pub last_modified: DateTime<Utc>,
    pub owner: String,
}

fn rfc3339_millis<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Errors produced while listing a directory.
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("failed to read directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lists every entry of `dir`, sorted by name, tagged with `owner`.
pub async fn get_files_status(dir: &Path, owner: &str) -> Result<Vec<FileStatus>, StatusError> {
    let read_dir_err = |source| StatusError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let mut result = Vec::with_capacity(names.len());
    for file in names {
        let path = dir.join(&file);
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|source| StatusError::Stat {
                path: path.clone(),
                source,
            })?;

        let stamp = metadata
            .created()
            .or_else(|_| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        result.push(FileStatus {
            file,
            size: pretty_size(metadata.len()),
            last_modified: DateTime::<Utc>::from(stamp),
            owner: owner.to_string(),
        });
    }

    tracing::debug!(dir = %dir.display(), count = result.len(), "listed directory");
    Ok(result)
}
