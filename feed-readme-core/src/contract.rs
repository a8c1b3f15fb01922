//! # contract: data model and trait seams for a run
//!
//! This module defines the two traits a run talks to the outside world through,
//! and the plain data passed across them:
//! - [`FeedSource`]: fetch and parse a feed into [`Feed`] / [`FeedItem`] values.
//! - [`DocumentStore`]: read a [`Document`] from the hosting API and write it back
//!   conditionally on its content hash.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` (`MockFeedSource`, `MockDocumentStore`),
//!   exported by the default `test-export-mocks` feature so dependents can use them
//!   in their own tests.
//!
//! ## Implementations
//! - See the `feed-readme` binary crate for the HTTP feed fetcher and the GitHub client.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;

use crate::error::{FeedError, StoreError};

/// A single value on a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::List(v)
    }
}

/// One feed entry as a bag of named fields. No schema is enforced:
/// looking up a field the feed did not provide yields `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeedItem {
    fields: BTreeMap<String, FieldValue>,
}

impl FeedItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field, if present and textual.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FeedItem
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut item = FeedItem::new();
        for (k, v) in iter {
            item.insert(k, v);
        }
        item
    }
}

/// A fetched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub title: Option<String>,
    /// `None` when the document exposed no item list at all, which is fatal for a run.
    /// `Some(vec![])` is a valid, empty feed.
    pub items: Option<Vec<FeedItem>>,
}

/// The target file as read from the hosting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Decoded UTF-8 text.
    pub content: String,
    /// Opaque content hash; must accompany the write.
    pub sha: String,
    pub path: String,
}

/// Everything needed for a conditional write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpdate {
    pub path: String,
    pub branch: String,
    /// New text, not yet encoded. The store handles transport encoding.
    pub content: String,
    /// Content hash captured at read time.
    pub sha: String,
    pub message: String,
}

/// Returned by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// New content hash of the file.
    pub content_sha: String,
    /// Hash of the commit that carried the change, when the API reports it.
    pub commit_sha: Option<String>,
}

/// Trait for fetching a feed by URL.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Download and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Feed, FeedError>;
}

/// Trait for reading and conditionally updating a single file on a hosted repository.
///
/// Implementors own the repository coordinates and credentials; callers only
/// deal with branch, path and content.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read `path` at `branch`, returning decoded text and its content hash.
    async fn read(&self, branch: &str, path: &str) -> Result<Document, StoreError>;

    /// Write new content. Must fail with [`StoreError::Conflict`] when `update.sha`
    /// no longer matches the file.
    async fn write(&self, update: FileUpdate) -> Result<WriteReceipt, StoreError>;

    /// The repository's default branch as reported by the hosting API.
    async fn default_branch(&self) -> Result<String, StoreError>;
}
