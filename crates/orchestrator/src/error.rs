#![forbid(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("data error: {0}")]
    Kernel(#[from] kernel::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("invalid path: {0}")]
    InvalidPath(PathBuf),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
