use crate::signals::SignalEvent;
use flume::{RecvError, SendError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("Failed to send signal event: {0}")]
    SendSignal(#[from] SendError<SignalEvent>),

    #[error("Signal channel closed: {0}")]
    RecvSignal(#[from] RecvError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::Error),

    #[error(transparent)]
    Orchestrator(#[from] orchestrator::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read stdin: {0}")]
    Stdin(#[source] io::Error),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
