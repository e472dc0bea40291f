use crate::event::ReviewEvent;
use crate::github::{HostingPlatform, PlatformError};
use tracing::{debug, info, warn};

/// Resolves the commits a review event puts under review
pub struct CommitResolver<'a, H: HostingPlatform> {
    platform: &'a H,
}

impl<'a, H: HostingPlatform> CommitResolver<'a, H> {
    pub fn new(platform: &'a H) -> Self {
        Self { platform }
    }

    /// Ordered commit ids for the event
    ///
    /// Events the review can't act on resolve to no commits with a warning;
    /// platform failures are returned.
    pub async fn resolve(&self, event: &ReviewEvent) -> Result<Vec<String>, PlatformError> {
        let commits = match event {
            ReviewEvent::Push { commits, .. } => commits.clone(),
            ReviewEvent::PullRequest { repo, number, .. } => {
                debug!("Listing commits of pull request {}#{}", repo, number);
                self.platform.list_pull_request_commits(repo, *number).await?
            }
            ReviewEvent::MissingContext { name, missing } => {
                warn!("Unable to retrieve {} info: payload has no {}", name, missing);
                Vec::new()
            }
            ReviewEvent::Other { name } => {
                warn!("Unrecognized event: {}", name);
                Vec::new()
            }
        };

        info!("Resolved {} commits for {} event", commits.len(), event.name());
        debug!("Commits: {:?}", commits);
        Ok(commits)
    }
}
