//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;

/// Errors emitted while fetching or decoding the question file.
///
/// These never reach gameplay: the bank logs them at the boundary and
/// degrades to an empty question set.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
    #[error("question fetch failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `RemoteProfileStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteProfileError {
    #[error("remote profile upsert failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
