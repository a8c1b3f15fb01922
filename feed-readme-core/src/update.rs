//! Update decision and the single mutating call of a run.

use tracing::{error, info};

use crate::contract::{DocumentStore, FileUpdate, WriteReceipt};
use crate::error::SyncError;

/// Whether the patched document should be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateDecision {
    /// Content unchanged and empty commits disabled.
    Skip,
    Write,
}

/// Skip only when empty commits are disabled and the text is unchanged
/// character for character. With empty commits enabled every run writes.
pub fn decide(old: &str, new: &str, empty_commits: bool) -> UpdateDecision {
    if !empty_commits && old == new {
        UpdateDecision::Skip
    } else {
        UpdateDecision::Write
    }
}

/// Submit `update` to the store. A stale content hash surfaces as
/// [`SyncError::ConcurrentModification`]; nothing is retried here.
pub async fn write_back<S>(store: &S, update: FileUpdate) -> Result<WriteReceipt, SyncError>
where
    S: DocumentStore + ?Sized,
{
    let path = update.path.clone();
    let branch = update.branch.clone();
    info!(path = %path, branch = %branch, sha = %update.sha, "[WRITE] Submitting updated document");

    match store.write(update).await {
        Ok(receipt) => {
            info!(
                path = %path,
                content_sha = %receipt.content_sha,
                commit_sha = receipt.commit_sha.as_deref().unwrap_or("-"),
                "[WRITE] Document written"
            );
            Ok(receipt)
        }
        Err(e) => {
            error!(path = %path, branch = %branch, error = %e, "[WRITE][ERROR] Write rejected");
            Err(SyncError::from(e))
        }
    }
}
