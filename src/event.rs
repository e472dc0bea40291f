use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Repository coordinates used to address the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The event that triggered the review run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewEvent {
    /// A push; its commits are listed inline, in push order
    Push { repo: RepoRef, commits: Vec<String> },
    /// A pull request; its commits have to be listed through the platform
    PullRequest {
        repo: RepoRef,
        number: u64,
        /// Triggered as `pull_request_target`
        target: bool,
    },
    /// A push or pull request whose payload lacks a field the review needs
    MissingContext { name: String, missing: &'static str },
    /// Any event kind the review doesn't handle
    Other { name: String },
}

#[derive(Deserialize)]
struct Payload {
    repository: Option<RepositoryPayload>,
    pull_request: Option<PullRequestPayload>,
    commits: Option<Vec<PushCommitPayload>>,
}

#[derive(Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(Deserialize)]
struct OwnerPayload {
    login: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct PullRequestPayload {
    number: u64,
}

#[derive(Deserialize)]
struct PushCommitPayload {
    id: String,
}

impl RepositoryPayload {
    fn into_repo_ref(self) -> Option<RepoRef> {
        let owner = self
            .owner
            .login
            .filter(|login| !login.is_empty())
            .or(self.owner.name)?;
        Some(RepoRef {
            owner,
            name: self.name,
        })
    }
}

impl ReviewEvent {
    /// Decode a GitHub Actions event name and its JSON payload
    ///
    /// Missing fields become [`ReviewEvent::MissingContext`]; fields of the
    /// wrong type are a decode error.
    pub fn from_payload(event_name: &str, payload: Value) -> Result<Self, serde_json::Error> {
        let target = match event_name {
            "push" => false,
            "pull_request" => false,
            "pull_request_target" => true,
            _ => {
                return Ok(Self::Other {
                    name: event_name.to_string(),
                });
            }
        };

        let payload: Payload = serde_json::from_value(payload)?;
        let missing = |field: &'static str| Self::MissingContext {
            name: event_name.to_string(),
            missing: field,
        };

        let Some(repo) = payload.repository else {
            return Ok(missing("repository"));
        };
        let Some(repo) = repo.into_repo_ref() else {
            return Ok(missing("repository.owner"));
        };

        if event_name == "push" {
            let Some(commits) = payload.commits else {
                return Ok(missing("commits"));
            };
            return Ok(Self::Push {
                repo,
                commits: commits.into_iter().map(|c| c.id).collect(),
            });
        }

        let Some(pull) = payload.pull_request else {
            return Ok(missing("pull_request"));
        };
        Ok(Self::PullRequest {
            repo,
            number: pull.number,
            target,
        })
    }

    /// GitHub's name for this event kind
    pub fn name(&self) -> &str {
        match self {
            Self::Push { .. } => "push",
            Self::PullRequest { target: false, .. } => "pull_request",
            Self::PullRequest { target: true, .. } => "pull_request_target",
            Self::MissingContext { name, .. } | Self::Other { name } => name,
        }
    }

    /// Repository the event happened in, when the payload carried one
    pub fn repo(&self) -> Option<&RepoRef> {
        match self {
            Self::Push { repo, .. } | Self::PullRequest { repo, .. } => Some(repo),
            Self::MissingContext { .. } | Self::Other { .. } => None,
        }
    }
}
