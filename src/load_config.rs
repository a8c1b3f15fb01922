/// `load_config` module: loads run inputs either from a YAML file or from a GitHub
/// Actions environment, and gathers the hosting context (repository, token, API URL,
/// default branch) from the environment.
///
/// # Responsibilities
/// - Parse user-supplied YAML into [`RawInputs`]; YAML scalars of any type are kept as
///   text so `max: 5` and `max: "5"` behave the same
/// - Read action inputs from `INPUT_<NAME>` variables
/// - Inject secrets (`GITHUB_TOKEN`) from the environment; secrets never live in the file
///
/// # Errors
/// All errors use `anyhow::Error` with context and are surfaced at the CLI boundary.
///
/// Typed validation of the inputs happens later, in [`RawInputs::resolve`].
use anyhow::{Context, Result};
use feed_readme_core::config::{RawInputs, Repository};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use crate::github::DEFAULT_API_URL;

/// Everything the CLI needs before talking to the network.
#[derive(Clone)]
pub struct CliConfig {
    pub inputs: RawInputs,
    pub repository: Repository,
    pub token: String,
    pub api_url: String,
    /// Default branch reported by the hosting context, if any.
    pub default_branch: Option<String>,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("inputs", &self.inputs)
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("default_branch", &self.default_branch)
            .finish()
    }
}

/// Any YAML scalar as text; null and missing become the empty string.
fn scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, got {other:?}"
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default, deserialize_with = "scalar")]
    feed_url: String,
    #[serde(default, deserialize_with = "scalar")]
    readme_section: String,
    #[serde(default, deserialize_with = "scalar")]
    empty_commits: String,
    #[serde(default, deserialize_with = "scalar")]
    max: String,
    #[serde(default, deserialize_with = "scalar")]
    template: String,
    #[serde(default, deserialize_with = "scalar")]
    branch: String,
    #[serde(default, deserialize_with = "scalar")]
    path: String,
    #[serde(default, deserialize_with = "scalar")]
    commit_message: String,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
}

/// Loads a YAML config file (no secrets) and injects the token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let file: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let inputs = RawInputs {
        feed_url: file.feed_url,
        readme_section: file.readme_section,
        empty_commits: file.empty_commits,
        max: file.max,
        template: file.template,
        branch: file.branch,
        path: file.path,
        commit_message: file.commit_message,
    };

    let repository = match file.repository {
        Some(repo) => repo,
        None => std::env::var("GITHUB_REPOSITORY").map_err(|e| {
            error!(error = ?e, "No repository in config and GITHUB_REPOSITORY not set");
            anyhow::anyhow!("repository missing from config and GITHUB_REPOSITORY not set")
        })?,
    };

    hosting_context(inputs, &repository, file.api_url)
}

/// Name of the environment variable carrying action input `name`.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

fn input(name: &str) -> String {
    raw_input(name).trim().to_string()
}

/// Untrimmed, for inputs where surrounding whitespace is content.
fn raw_input(name: &str) -> String {
    std::env::var(input_var(name)).unwrap_or_default()
}

/// Loads inputs the way a GitHub Action receives them (`INPUT_FEED-URL`, ...).
pub fn load_action_config() -> Result<CliConfig> {
    info!("Loading configuration from GitHub Actions environment");
    let inputs = RawInputs {
        feed_url: input("feed-url"),
        readme_section: input("readme-section"),
        empty_commits: input("empty-commits"),
        max: input("max"),
        template: raw_input("template"),
        branch: input("branch"),
        path: input("path"),
        commit_message: input("commit-message"),
    };

    let repository = std::env::var("GITHUB_REPOSITORY").map_err(|e| {
        error!(error = ?e, "GITHUB_REPOSITORY environment variable not set");
        anyhow::anyhow!("GITHUB_REPOSITORY environment variable not set: {e}")
    })?;

    hosting_context(inputs, &repository, None)
}

fn hosting_context(
    inputs: RawInputs,
    repository: &str,
    api_url: Option<String>,
) -> Result<CliConfig> {
    let repository = Repository::parse(repository)?;

    let token = match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.is_empty() => {
            info!("GITHUB_TOKEN found in env");
            token
        }
        _ => {
            let token = input("github-token");
            if token.is_empty() {
                error!("GITHUB_TOKEN environment variable not set");
                anyhow::bail!("GITHUB_TOKEN environment variable not set");
            }
            info!("Token taken from github-token input");
            token
        }
    };

    let api_url = api_url
        .or_else(|| std::env::var("GITHUB_API_URL").ok())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let default_branch = match std::env::var("GITHUB_EVENT_PATH") {
        Ok(event_path) if !event_path.is_empty() => default_branch_from_event(&event_path)?,
        _ => None,
    };

    info!(
        repository = %repository,
        api_url = %api_url,
        default_branch = default_branch.as_deref().unwrap_or("-"),
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        inputs,
        repository,
        token,
        api_url,
        default_branch,
    })
}

/// `repository.default_branch` from the webhook payload that triggered the workflow.
pub fn default_branch_from_event<P: AsRef<Path>>(event_path: P) -> Result<Option<String>> {
    let event_path = event_path.as_ref();
    let raw = fs::read_to_string(event_path)
        .with_context(|| format!("Failed to read event payload {:?}", event_path))?;
    let payload: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse event payload {:?}", event_path))?;

    let branch = payload
        .pointer("/repository/default_branch")
        .and_then(|b| b.as_str())
        .map(str::to_string);
    if branch.is_none() {
        warn!(event_path = ?event_path, "Event payload has no repository.default_branch");
    }
    Ok(branch)
}
