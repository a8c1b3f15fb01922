//! GitHub contents API client implementing [`DocumentStore`].
//!
//! - Read: `GET /repos/{owner}/{repo}/contents/{path}?ref={branch}` (base64 body, blob sha)
//! - Write: `PUT /repos/{owner}/{repo}/contents/{path}` with the blob sha read earlier;
//!   GitHub answers `409 Conflict` when that sha is stale
//! - Default branch: `GET /repos/{owner}/{repo}`

use async_trait::async_trait;
use base64::Engine;
use feed_readme_core::config::Repository;
use feed_readme_core::contract::{Document, DocumentStore, FileUpdate, WriteReceipt};
use feed_readme_core::error::StoreError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Client for one repository, authenticated with a token.
pub struct GitHubClient {
    http: Client,
    api_url: String,
    repo: Repository,
    token: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    encoding: Option<String>,
    sha: String,
    path: String,
}

#[derive(Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Serialize)]
struct UpdateContentsRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct UpdateContentsResponse {
    content: UpdatedContent,
    commit: Option<UpdatedCommit>,
}

#[derive(Deserialize)]
struct UpdatedContent {
    sha: String,
}

#[derive(Deserialize)]
struct UpdatedCommit {
    sha: String,
}

impl GitHubClient {
    pub fn new(http: Client, api_url: &str, repo: Repository, token: String) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            repo,
            token,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_url, self.repo.owner, self.repo.name, path
        )
    }

    fn contents_url(&self, path: &str) -> String {
        self.api_url(&format!("/contents/{}", path.trim_start_matches('/')))
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", concat!("feed-readme/", env!("CARGO_PKG_VERSION")))
    }

    async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        self.authorized(req).send().await.map_err(|e| {
            error!(error = ?e, repo = %self.repo, "Request to GitHub failed");
            StoreError::Request(e.to_string())
        })
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        path: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| StoreError::Deserialization(e.to_string()));
        }

        let message = response.text().await.unwrap_or_default();
        error!(status = %status, repo = %self.repo, path, branch, message = %message, "GitHub API returned error");
        Err(map_status(status, message, path, branch, sha))
    }
}

/// Map a non-success status to a [`StoreError`]. `sha` is the content hash sent
/// with a write, if any.
pub fn map_status(
    status: StatusCode,
    message: String,
    path: &str,
    branch: &str,
    sha: Option<&str>,
) -> StoreError {
    match (status.as_u16(), sha) {
        (401 | 403, _) => StoreError::Unauthorized,
        (404, _) => StoreError::NotFound {
            path: path.to_string(),
            branch: branch.to_string(),
        },
        (409, Some(sha)) => StoreError::Conflict {
            path: path.to_string(),
            sha: sha.to_string(),
        },
        // "sha" wasn't supplied / does not match
        (422, Some(sha)) if message.contains("sha") => StoreError::Conflict {
            path: path.to_string(),
            sha: sha.to_string(),
        },
        (status, _) => StoreError::Api { status, message },
    }
}

/// Decode GitHub's base64 payload, which is wrapped with line breaks.
pub fn decode_content(encoded: &str, path: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

pub fn encode_content(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

#[async_trait]
impl DocumentStore for GitHubClient {
    async fn read(&self, branch: &str, path: &str) -> Result<Document, StoreError> {
        info!(repo = %self.repo, branch, path, "Reading file from GitHub");
        let req = self
            .http
            .get(self.contents_url(path))
            .query(&[("ref", branch)]);
        let resp = self.send(req).await?;
        let body: ContentsResponse = self.handle_response(resp, path, branch, None).await?;

        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(StoreError::Decode {
                    path: body.path,
                    reason: format!("unsupported encoding {encoding:?}"),
                });
            }
        }
        let content = decode_content(body.content.as_deref().unwrap_or(""), &body.path)?;
        debug!(path = %body.path, sha = %body.sha, len = content.len(), "Decoded file content");

        Ok(Document {
            content,
            sha: body.sha,
            path: body.path,
        })
    }

    async fn write(&self, update: FileUpdate) -> Result<WriteReceipt, StoreError> {
        info!(repo = %self.repo, branch = %update.branch, path = %update.path, sha = %update.sha, "Updating file on GitHub");
        let payload = UpdateContentsRequest {
            message: &update.message,
            content: encode_content(&update.content),
            sha: &update.sha,
            branch: &update.branch,
        };
        let req = self.http.put(self.contents_url(&update.path)).json(&payload);
        let resp = self.send(req).await?;
        let body: UpdateContentsResponse = self
            .handle_response(resp, &update.path, &update.branch, Some(&update.sha))
            .await?;

        Ok(WriteReceipt {
            content_sha: body.content.sha,
            commit_sha: body.commit.map(|c| c.sha),
        })
    }

    async fn default_branch(&self) -> Result<String, StoreError> {
        info!(repo = %self.repo, "Looking up default branch");
        let resp = self.send(self.http.get(self.api_url(""))).await?;
        let body: RepoResponse = self.handle_response(resp, "", "", None).await?;
        Ok(body.default_branch)
    }
}
