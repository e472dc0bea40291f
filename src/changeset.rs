use crate::event::RepoRef;
use crate::github::{CommitFile, FileStatus, HostingPlatform, PlatformError};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, trace};

/// A file touched by one commit under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path of the file; unique within a commit, not across commits
    pub name: String,
    /// Unified diff of the change; absent for binary or oversized diffs
    pub patch: Option<String>,
    /// Commit that made the change
    pub commit_id: String,
}

impl FileChange {
    fn from_commit_file(file: CommitFile, commit_id: &str) -> Option<Self> {
        match file.status {
            FileStatus::Added | FileStatus::Modified => Some(Self {
                name: file.filename,
                patch: file.patch,
                commit_id: commit_id.to_string(),
            }),
            _ => {
                trace!("Skipping {} ({:?}) in {}", file.filename, file.status, commit_id);
                None
            }
        }
    }
}

/// Fetches the changed files of every commit under review
pub struct ChangeSetFetcher<'a, H: HostingPlatform> {
    platform: &'a H,
    max_parallel_fetches: Option<usize>,
}

impl<'a, H: HostingPlatform> ChangeSetFetcher<'a, H> {
    pub fn new(platform: &'a H, max_parallel_fetches: Option<usize>) -> Self {
        Self {
            platform,
            max_parallel_fetches,
        }
    }

    /// Added and modified files across all commits, in no particular order
    ///
    /// All commits are fetched concurrently and joined. The first failure
    /// fails the whole fetch.
    pub async fn fetch(
        &self,
        repo: &RepoRef,
        commit_ids: &[String],
    ) -> Result<Vec<FileChange>, PlatformError> {
        let futures = commit_ids
            .iter()
            .map(|commit_id| self.fetch_commit(repo, commit_id));

        let per_commit: Vec<Vec<FileChange>> = match self.max_parallel_fetches {
            Some(max) => {
                debug!("Fetching {} commits, at most {} at a time", commit_ids.len(), max);
                stream::iter(futures)
                    .buffer_unordered(max.max(1))
                    .try_collect()
                    .await?
            }
            None => {
                debug!("Fetching {} commits", commit_ids.len());
                try_join_all(futures).await?
            }
        };

        let files: Vec<FileChange> = per_commit.into_iter().flatten().collect();
        info!(
            "Found {} added or modified files across {} commits",
            files.len(),
            commit_ids.len()
        );
        Ok(files)
    }

    async fn fetch_commit(
        &self,
        repo: &RepoRef,
        commit_id: &str,
    ) -> Result<Vec<FileChange>, PlatformError> {
        let files = self.platform.commit_files(repo, commit_id).await?;
        Ok(files
            .into_iter()
            .filter_map(|file| FileChange::from_commit_file(file, commit_id))
            .collect())
    }
}
