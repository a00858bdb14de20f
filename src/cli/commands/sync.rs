//! Implementation of the sync run: the binary's only command.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::adapters::cache::FileCache;
use crate::adapters::plugins::{DebbugsClient, GitHubClient, GitHubClientConfig};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::Cli;
use crate::domain::models::Config;
use crate::domain::ports::{BugCache, NoopCache};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::infrastructure::retry::RetryPolicy;
use crate::services::{
    BugSource, Reconciler, RepositoryStatus, SyncOptions, SyncReport, Throttler,
};

impl CommandOutput for SyncReport {
    fn to_human(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Package").add_attribute(Attribute::Bold),
                Cell::new("Repository").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
                Cell::new("Bugs").add_attribute(Attribute::Bold),
                Cell::new("Skipped").add_attribute(Attribute::Bold),
                Cell::new("Issues").add_attribute(Attribute::Bold),
                Cell::new("Comments").add_attribute(Attribute::Bold),
                Cell::new("State").add_attribute(Attribute::Bold),
                Cell::new("Dry-run").add_attribute(Attribute::Bold),
                Cell::new("Anomalies").add_attribute(Attribute::Bold),
            ]);

        for repo in &self.repositories {
            let status = match &repo.status {
                RepositoryStatus::Completed => Cell::new("ok").fg(Color::Green),
                RepositoryStatus::LabelMissing => Cell::new("label missing").fg(Color::Yellow),
                RepositoryStatus::Failed(reason) => {
                    Cell::new(format!("failed: {reason}")).fg(Color::Red)
                }
            };
            table.add_row(vec![
                Cell::new(&repo.package),
                Cell::new(&repo.repository),
                status,
                Cell::new(repo.bugs_seen),
                Cell::new(repo.bugs_skipped),
                Cell::new(repo.issues_created),
                Cell::new(repo.comments_created),
                Cell::new(repo.state_changes),
                Cell::new(repo.suppressed_actions),
                Cell::new(repo.duplicate_issues + repo.malformed_titles),
            ]);
        }

        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "success": self.is_success(),
            "mutations": self.mutations(),
            "repositories": self.repositories,
        })
    }
}

/// Wire the clients, cache and throttler described by `config`.
pub fn build_reconciler(config: &Config, dry_run: bool, no_cache: bool) -> Result<Reconciler> {
    let retry = RetryPolicy::from(&config.retry);
    let host = GitHubClient::new(GitHubClientConfig::new(
        config.github_api_token.clone(),
        &config.github,
        retry,
    ))
    .context("Failed to create GitHub client")?;
    let tracker = DebbugsClient::new(&config.debbugs).context("Failed to create BTS client")?;

    let cache: Arc<dyn BugCache> = if config.cache.enabled && !no_cache {
        tracing::debug!(dir = %config.cache.dir, "Using on-disk BTS cache");
        Arc::new(FileCache::new(&config.cache.dir))
    } else {
        Arc::new(NoopCache)
    };

    let bugs = BugSource::new(
        Arc::new(tracker),
        cache,
        Duration::from_secs(config.cache.ttl_secs),
    );
    let options = SyncOptions {
        dry_run,
        create_resolved_bugs: config.sync.create_resolved_bugs,
    };

    Ok(Reconciler::new(
        bugs,
        Arc::new(host),
        Throttler::new(config.throttle.clone()),
        options,
    ))
}

/// Load the configuration, run one pass over every mapping and print the
/// report.
pub async fn execute(cli: &Cli) -> Result<SyncReport> {
    let config = ConfigLoader::load(&cli.config)?;

    let log_config = LogConfig::from_settings(&config.logging, cli.debug)?;
    let _logger = LoggerImpl::init(&log_config)?;

    if cli.dry_run {
        tracing::info!("Dry run: no changes will be made on GitHub");
    }

    let reconciler = build_reconciler(&config, cli.dry_run, cli.no_cache)?;
    let report = reconciler
        .run(&config.repositories, &config.sync_label)
        .await;

    output(&report, cli.json);
    Ok(report)
}
