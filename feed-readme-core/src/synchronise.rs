//! High-level pipeline: orchestrates fetch → render → read → patch → write for one run.
//!
//! A run walks a fixed sequence of states:
//!
//! ```text
//! Idle → FeedFetched → Rendered → DocumentRead → Patched → {Skipped | Written | Failed}
//! ```
//!
//! Every stage awaits the previous one; nothing runs concurrently and nothing is
//! resumable across runs.
//!
//! # Responsibilities
//! - Fail fast: the first failing stage ends the run with a [`SyncError`]
//! - The only mutating call is the final write (see [`crate::update::write_back`])
//! - An unchanged document with empty commits disabled is a successful skip, not an error
//!
//! # Callable From
//! - The CLI crate and integration tests; both supply [`FeedSource`] and
//!   [`DocumentStore`] implementations (real or mocked).

use std::fmt;

use tracing::{debug, error, info};

use crate::config::RunConfig;
use crate::contract::{DocumentStore, FeedSource, FileUpdate};
use crate::error::SyncError;
use crate::render::render_items;
use crate::section::replace_section;
use crate::update::{decide, write_back, UpdateDecision};

/// Stage of a run, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    FeedFetched,
    Rendered,
    DocumentRead,
    Patched,
    Skipped,
    Written,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Written {
        content_sha: String,
        commit_sha: Option<String>,
    },
    /// Content unchanged and empty commits disabled; no write happened.
    Skipped,
}

/// Report of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub items_rendered: usize,
    pub branch: String,
    pub path: String,
}

impl SyncReport {
    pub fn final_state(&self) -> RunState {
        match self.outcome {
            SyncOutcome::Written { .. } => RunState::Written,
            SyncOutcome::Skipped => RunState::Skipped,
        }
    }
}

fn enter(state: RunState) {
    info!(state = %state, "[SYNC] State transition");
}

pub async fn synchronise<F, S>(
    config: &RunConfig,
    feeds: &F,
    store: &S,
) -> Result<SyncReport, SyncError>
where
    F: FeedSource + ?Sized,
    S: DocumentStore + ?Sized,
{
    enter(RunState::Idle);
    let result = run_stages(config, feeds, store).await;
    match &result {
        Ok(report) => enter(report.final_state()),
        Err(e) => {
            error!(error = %e, "[SYNC][ERROR] Run failed");
            enter(RunState::Failed);
        }
    }
    result
}

async fn run_stages<F, S>(
    config: &RunConfig,
    feeds: &F,
    store: &S,
) -> Result<SyncReport, SyncError>
where
    F: FeedSource + ?Sized,
    S: DocumentStore + ?Sized,
{
    // --- Fetch ---
    info!(feed_url = %config.feed_url, "[SYNC] Fetching feed");
    let feed = feeds.fetch(&config.feed_url).await?;
    let items = feed.items.ok_or_else(|| {
        error!(feed_url = %config.feed_url, "[SYNC][ERROR] Feed exposed no item list");
        SyncError::MissingItems
    })?;
    info!(items = items.len(), title = feed.title.as_deref().unwrap_or(""), "[SYNC] Feed fetched");
    enter(RunState::FeedFetched);

    // --- Render ---
    let items_rendered = items.len().min(config.max);
    let rendered = render_items(&items, config.max, &config.template)?;
    enter(RunState::Rendered);

    // --- Read ---
    info!(branch = %config.branch, path = %config.path, "[SYNC] Reading current document");
    let document = store.read(&config.branch, &config.path).await?;
    debug!(sha = %document.sha, len = document.content.len(), "[SYNC] Document read");
    enter(RunState::DocumentRead);

    // --- Patch ---
    let patched = replace_section(&document.content, &config.section, &rendered)?;
    enter(RunState::Patched);

    // --- Decide / write ---
    match decide(&document.content, &patched, config.empty_commits) {
        UpdateDecision::Skip => {
            info!(path = %document.path, "[SYNC] Document unchanged and empty commits disabled, skipping write");
            Ok(SyncReport {
                outcome: SyncOutcome::Skipped,
                items_rendered,
                branch: config.branch.clone(),
                path: document.path,
            })
        }
        UpdateDecision::Write => {
            let update = FileUpdate {
                path: document.path.clone(),
                branch: config.branch.clone(),
                content: patched,
                sha: document.sha,
                message: config.commit_message.clone(),
            };
            let receipt = write_back(store, update).await?;
            Ok(SyncReport {
                outcome: SyncOutcome::Written {
                    content_sha: receipt.content_sha,
                    commit_sha: receipt.commit_sha,
                },
                items_rendered,
                branch: config.branch.clone(),
                path: document.path,
            })
        }
    }
}
