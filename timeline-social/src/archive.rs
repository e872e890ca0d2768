//! Persisted batches of raw posts: a JSON array of [`RawPost`] objects.
//!
//! The batch stores the decoded view, not the response bytes. Unmodelled fields
//! are written back verbatim, explicit `null`s on modelled fields are omitted,
//! and the boolean flags are always written. Loading a batch gives back posts
//! equal to the ones saved.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SocialError};
use crate::normalize::normalize_all;
use crate::table::{Timeline, to_table};
use crate::twitter::types::RawPost;

/// Write `posts` to `path`, replacing it atomically.
pub fn save_batch(path: &Path, posts: &[RawPost]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(posts).map_err(|source| SocialError::ArchiveFormat {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|source| io_error(&tmp, source))?;
    fs::rename(&tmp, path).map_err(|source| io_error(path, source))?;

    tracing::info!(path = %path.display(), posts = posts.len(), "batch saved");
    Ok(())
}

pub fn load_batch(path: &Path) -> Result<Vec<RawPost>> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    let posts: Vec<RawPost> =
        serde_json::from_slice(&bytes).map_err(|source| SocialError::ArchiveFormat {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), posts = posts.len(), "batch loaded");
    Ok(posts)
}

/// Load, normalize and assemble each archive into its own [`Timeline`].
pub fn load_timelines<P: AsRef<Path>>(paths: &[P], target_timezone: &str) -> Result<Vec<Timeline>> {
    paths
        .iter()
        .map(|p| {
            let posts = load_batch(p.as_ref())?;
            to_table(normalize_all(&posts)?, target_timezone)
        })
        .collect()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> SocialError {
    SocialError::ArchiveIo {
        path: path.to_path_buf(),
        source,
    }
}
