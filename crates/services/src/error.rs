//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use testset_core::PhaseError;
use testset_core::model::ItemId;

/// Errors emitted by a `SubmissionGateway`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("request failed with status {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while encoding or decoding item page links.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigationError {
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("missing query parameter `{0}`")]
    MissingParam(&'static str),
    #[error("not an item page: {0}")]
    NotAnItemPage(String),
    #[error("base url cannot carry a path: {0}")]
    CannotBeABase(String),
}

/// Errors emitted by the test-set taking services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("test set has no duration")]
    MissingDuration,
    #[error("no cached attempt for this submission")]
    NotStarted,
    #[error("unknown item {0}")]
    UnknownItem(ItemId),
    #[error("final submission is not in flight")]
    NotSubmitting,
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
