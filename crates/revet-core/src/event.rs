//! Inbound pull-request event model.
//!
//! Mirrors the hosting service's webhook payload shape. Deserialized once
//! per delivery and treated as immutable for the rest of the run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Action field of a pull-request event.
///
/// Only `opened` and `synchronize` trigger a review; everything else,
/// including actions this enum does not name, is acknowledged and ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Opened,
    Synchronize,
    Reopened,
    Closed,
    #[serde(other)]
    Other,
}

impl ReviewAction {
    /// Whether this action should trigger a pipeline run.
    pub fn triggers_review(&self) -> bool {
        matches!(self, ReviewAction::Opened | ReviewAction::Synchronize)
    }
}

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Open,
    Closed,
    #[serde(other)]
    Unknown,
}

/// A pull-request webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEvent {
    pub action: ReviewAction,
    pub number: u64,
    pub pull_request: PullRequest,
}

/// The pull request under review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub url: String,
    pub state: ReviewState,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub base: GitReference,
    pub head: GitReference,
}

impl PullRequest {
    /// Whether the review is already closed.
    pub fn is_closed(&self) -> bool {
        self.state == ReviewState::Closed
    }
}

/// One side of a pull request: a branch plus the repository holding it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitReference {
    #[serde(default)]
    pub label: String,
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
    pub repo: Repository,
}

/// Repository description as delivered in webhook payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub clone_url: String,
    pub owner: Owner,
}

/// Repository owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// `owner/name` pair addressing a repository in API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl From<&Repository> for RepoId {
    fn from(repo: &Repository) -> Self {
        Self {
            owner: repo.owner.login.clone(),
            name: repo.name.clone(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
