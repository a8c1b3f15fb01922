///
/// This module implements the CLI interface for feed-readme: command parsing,
/// wiring the real feed fetcher and GitHub client into the core pipeline, and
/// user-visible reporting.
///
/// All rendering, patching and update decisions live in the [`feed-readme-core`] crate.
///
/// ## How To Use
/// - `feed-readme sync --config feed-readme.yaml` with `GITHUB_TOKEN` set.
/// - `feed-readme action` inside a GitHub Actions job.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`feed-readme-core`]: ../../feed-readme-core/
use crate::feed::HttpFeedSource;
use crate::github::GitHubClient;
use crate::load_config::{load_action_config, load_config, CliConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_readme_core::config::{RawInputs, RunConfig};
use feed_readme_core::contract::DocumentStore;
use feed_readme_core::synchronise::{synchronise, SyncOutcome};
use std::path::PathBuf;
use std::time::Duration;

/// CLI for feed-readme: keep a README section in sync with a feed.
#[derive(Parser)]
#[clap(
    name = "feed-readme",
    version,
    about = "Render the latest feed items into a marked section of a repository README"
)]
pub struct Cli {
    /// Timeout for each HTTP request, in seconds
    #[clap(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update the README section using the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Update the README section using GitHub Actions inputs (INPUT_* variables)
    Action,
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let config = match cli.command {
        Commands::Sync { config } => load_config(config)?,
        Commands::Action => load_action_config()?,
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    execute(config, http).await
}

/// Wire the HTTP feed fetcher and the GitHub client into one synchronisation run.
pub async fn execute(config: CliConfig, http: reqwest::Client) -> Result<()> {
    let store = GitHubClient::new(
        http.clone(),
        &config.api_url,
        config.repository.clone(),
        config.token.clone(),
    );

    let run_config =
        resolve_run_config(&config.inputs, config.default_branch.as_deref(), &store).await?;
    run_config.trace_loaded();

    let feeds = HttpFeedSource::new(http);
    tracing::info!(command = "sync", repository = %config.repository, "Starting feed synchronisation");
    match synchronise(&run_config, &feeds, &store).await {
        Ok(report) => {
            match &report.outcome {
                SyncOutcome::Written { content_sha, commit_sha } => {
                    println!(
                        "Updated {} on {} ({} items, content {}, commit {})",
                        report.path,
                        report.branch,
                        report.items_rendered,
                        content_sha,
                        commit_sha.as_deref().unwrap_or("-")
                    );
                }
                SyncOutcome::Skipped => {
                    println!(
                        "{} on {} is already up to date, nothing to commit",
                        report.path, report.branch
                    );
                }
            }
            tracing::info!(command = "sync", ?report, "Synchronisation complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e))
        }
    }
}

/// Resolve the inputs, asking `store` for the repository default branch only
/// when neither the inputs nor the hosting context name a branch. The lookup
/// happens once, before any document call.
pub async fn resolve_run_config<S: DocumentStore + ?Sized>(
    inputs: &RawInputs,
    context_branch: Option<&str>,
    store: &S,
) -> Result<RunConfig> {
    let mut default_branch = context_branch.map(str::to_string);
    if inputs.needs_default_branch() && default_branch.is_none() {
        let branch = store
            .default_branch()
            .await
            .context("Failed to look up the repository default branch")?;
        default_branch = Some(branch);
    }
    Ok(inputs.resolve(default_branch.as_deref())?)
}
