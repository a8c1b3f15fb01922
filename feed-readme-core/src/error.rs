//! Error types for each stage of a run
//!
//! - `FeedError`: feed download/parse failures (raised by [`crate::contract::FeedSource`])
//! - `StoreError`: hosting API failures (raised by [`crate::contract::DocumentStore`])
//! - `RenderError`: template compile/render failures
//! - `SectionError`: marker lookup failures
//! - `ConfigError`: input validation and resolution failures
//! - `SyncError`: what a whole run fails with

use thiserror::Error;

/// Feed retrieval errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Feed server returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Feed could not be parsed as RSS or Atom: {0}")]
    Parse(String),
}

/// Hosting API errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("File not found: {path}@{branch}")]
    NotFound { path: String, branch: String },

    /// The content hash sent with a write no longer matches the file.
    #[error("Content hash {sha} is stale for {path}")]
    Conflict { path: String, sha: String },

    #[error("Unauthorized - invalid or missing token")]
    Unauthorized,

    #[error("Content of {path} could not be decoded: {reason}")]
    Decode { path: String, reason: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Template errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template does not compile: {0}")]
    Template(String),

    #[error("Rendering item {index} failed: {reason}")]
    Item { index: usize, reason: String },
}

/// Section marker errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    #[error(
        "Contents do not contain exactly one start/end comment pair for section \"{section}\" \
         (found {starts} start and {ends} end markers)"
    )]
    NotFound {
        section: String,
        starts: usize,
        ends: usize,
    },

    #[error("End marker precedes start marker for section \"{section}\"")]
    Misordered { section: String },

    #[error("Section name {0:?} cannot be embedded in a marker comment")]
    InvalidName(String),
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required input: {0}")]
    Missing(&'static str),

    #[error("max must be a non-negative integer, got {0:?}")]
    InvalidMax(String),

    #[error("repository must look like owner/name, got {0:?}")]
    InvalidRepository(String),

    #[error("No branch given and the repository default branch is unknown")]
    UnresolvedBranch,

    #[error(transparent)]
    Section(#[from] SectionError),
}

/// Failure of a whole run. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(#[from] FeedError),

    #[error("feed.items was not found!")]
    MissingItems,

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Section not found: {0}")]
    SectionNotFound(#[from] SectionError),

    /// Someone else changed the file between read and write. Safe to retry the whole run.
    #[error("{path} was modified concurrently (stale content hash {sha})")]
    ConcurrentModification { path: String, sha: String },

    #[error("Hosting API error: {0}")]
    Hosting(StoreError),
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { path, sha } => SyncError::ConcurrentModification { path, sha },
            other => SyncError::Hosting(other),
        }
    }
}
