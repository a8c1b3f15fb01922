//! Run configuration: raw text inputs and their resolution into a typed [`RunConfig`].
//!
//! Inputs arrive as text (action inputs, YAML scalars) and are resolved exactly
//! once, before any network call, so the pipeline never sees half-parsed values.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::section::SectionMarkers;

pub const DEFAULT_PATH: &str = "README.md";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Updating README";

/// Inputs exactly as the user supplied them. Empty strings count as "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInputs {
    pub feed_url: String,
    pub readme_section: String,
    pub empty_commits: String,
    pub max: String,
    pub template: String,
    pub branch: String,
    pub path: String,
    pub commit_message: String,
}

/// Owner/name pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository(s.to_string())),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub feed_url: String,
    pub section: String,
    pub empty_commits: bool,
    pub max: usize,
    pub template: String,
    /// Always concrete; fallback to the default branch already happened.
    pub branch: String,
    pub path: String,
    pub commit_message: String,
}

impl RunConfig {
    pub fn trace_loaded(&self) {
        info!(
            feed_url = %self.feed_url,
            section = %self.section,
            empty_commits = self.empty_commits,
            max = self.max,
            branch = %self.branch,
            path = %self.path,
            "Resolved run configuration"
        );
        debug!(?self, "Run configuration (full debug)");
    }
}

/// Any value other than the literal `false` enables empty commits.
pub fn parse_empty_commits(raw: &str) -> bool {
    raw != "false"
}

/// Parse the item limit. Surrounding whitespace is ignored; anything that is not
/// a non-negative integer is rejected instead of being treated as zero.
pub fn parse_max(raw: &str) -> Result<usize, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Missing("max"));
    }
    trimmed
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidMax(raw.to_string()))
}

/// Pick the explicit branch, else the repository default branch.
pub fn resolve_branch(explicit: &str, default_branch: Option<&str>) -> Result<String, ConfigError> {
    if !explicit.is_empty() {
        return Ok(explicit.to_string());
    }
    match default_branch {
        Some(b) if !b.is_empty() => {
            info!(branch = b, "No branch given, using repository default branch");
            Ok(b.to_string())
        }
        _ => Err(ConfigError::UnresolvedBranch),
    }
}

fn required(value: &str, name: &'static str) -> Result<String, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(value.to_string())
    }
}

impl RawInputs {
    /// True when the branch must come from the hosting context.
    pub fn needs_default_branch(&self) -> bool {
        self.branch.is_empty()
    }

    /// Validate and type every input. `default_branch` is only consulted when
    /// no branch was given.
    pub fn resolve(&self, default_branch: Option<&str>) -> Result<RunConfig, ConfigError> {
        let feed_url = required(&self.feed_url, "feed-url")?;
        let section = required(&self.readme_section, "readme-section")?;
        SectionMarkers::for_section(&section)?;
        // kept verbatim, a trailing line break can be part of the template
        if self.template.trim().is_empty() {
            return Err(ConfigError::Missing("template"));
        }
        let template = self.template.clone();
        let max = parse_max(&self.max)?;
        let empty_commits = parse_empty_commits(&self.empty_commits);
        let branch = resolve_branch(&self.branch, default_branch)?;

        let path = if self.path.is_empty() {
            DEFAULT_PATH.to_string()
        } else {
            self.path.clone()
        };
        let commit_message = if self.commit_message.is_empty() {
            DEFAULT_COMMIT_MESSAGE.to_string()
        } else {
            self.commit_message.clone()
        };

        if max == 0 {
            warn!("max is 0, the section will always be emptied");
        }

        Ok(RunConfig {
            feed_url,
            section,
            empty_commits,
            max,
            template,
            branch,
            path,
            commit_message,
        })
    }
}
