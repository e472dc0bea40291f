use crate::alerts::{self, AlertReport};
use crate::attribution::ReviewChanges;
use crate::changeset::ChangeSetFetcher;
use crate::config::Config;
use crate::event::ReviewEvent;
use crate::github::HostingPlatform;
use crate::resolver::CommitResolver;
use anyhow::Context;
use tracing::{debug, info, warn};

/// Collect every file change the event puts under review
///
/// Events without a repository yield no changes. Platform failures abort.
pub async fn collect_changes<H: HostingPlatform>(
    event: &ReviewEvent,
    platform: &H,
    config: &Config,
) -> anyhow::Result<ReviewChanges> {
    let commits = CommitResolver::new(platform)
        .resolve(event)
        .await
        .context("Failed to resolve commits under review")?;

    let Some(repo) = event.repo() else {
        debug!("No repository for {} event, nothing to attribute", event.name());
        return Ok(ReviewChanges::new(Vec::new()));
    };
    if commits.is_empty() {
        warn!("No commits under review in {}", repo);
        return Ok(ReviewChanges::new(Vec::new()));
    }

    let files = ChangeSetFetcher::new(platform, config.fetch.max_parallel_fetches)
        .fetch(repo, &commits)
        .await
        .with_context(|| format!("Failed to fetch changed files of {}", repo))?;

    Ok(ReviewChanges::new(files))
}

/// Resolve, fetch, and filter a Vale report for one review event
pub async fn run<H: HostingPlatform>(
    event: &ReviewEvent,
    platform: &H,
    config: &Config,
    report: AlertReport,
) -> anyhow::Result<AlertReport> {
    info!("Reviewing {} event", event.name());
    let changes = collect_changes(event, platform, config).await?;
    let kept = alerts::filter_report(report, &changes)
        .context("Failed to attribute alerts to added lines")?;
    debug!("Parsed {} patches", changes.attribution().parsed_patches());
    Ok(kept)
}
