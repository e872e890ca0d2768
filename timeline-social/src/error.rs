use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use timeline_http::HttpError;

#[derive(Debug, Error)]
pub enum SocialError {
    /// Transport, auth and rate-limit failures from the API client, unchanged.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("malformed post {id}: {field}")]
    MalformedRecord { id: String, field: String },

    #[error(
        "pagination stalled for @{handle}: requested max_id {max_id} but the page reached id {offending}"
    )]
    Pagination {
        handle: String,
        max_id: u64,
        offending: u64,
    },

    #[error("timeline fetch for @{handle} exceeded its {deadline:?} deadline")]
    Timeout { handle: String, deadline: Duration },

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("archive {path}: {source}")]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive {path}: {source}")]
    ArchiveFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, SocialError>;
