//! Hosting-service API: the outbound calls the bot needs.
//!
//! One stateless client is built at process start and shared by every
//! concurrent run. The [`ReviewApi`] trait is the seam the report manager
//! talks through, so tests run against an in-memory fake instead.

use crate::error::{Result, RevetError};
use crate::event::RepoId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Production API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "revet";
const API_TIMEOUT_SECS: u64 = 30;

/// Maximum length of an error body carried into an error value.
const MAX_ERROR_BODY_LEN: usize = 200;

/// A comment on a review, as returned by the hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub user: CommentAuthor,
    pub created_at: DateTime<Utc>,
}

/// Author of a comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
}

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct EditPullRequest<'a> {
    title: &'a str,
    body: &'a str,
    state: &'a str,
}

/// Outbound calls used by the report manager.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// List the comments on a review.
    async fn list_comments(&self, repo: &RepoId, number: u64) -> Result<Vec<Comment>>;

    /// Delete a single comment by id.
    async fn delete_comment(&self, repo: &RepoId, comment_id: u64) -> Result<()>;

    /// Post a new comment on a review.
    async fn create_comment(&self, repo: &RepoId, number: u64, body: &str) -> Result<()>;

    /// Close a review, preserving the title and body it already has.
    async fn close_review(&self, repo: &RepoId, number: u64, title: &str, body: &str)
        -> Result<()>;
}

/// `ReviewApi` backed by the GitHub REST API.
pub struct GithubClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl GithubClient {
    /// Client against the production endpoint.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base(DEFAULT_API_BASE, token)
    }

    /// Client against an alternate endpoint (enterprise installs, tests).
    pub fn with_base(base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(API_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base: base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        Err(RevetError::ApiStatus {
            status,
            url,
            body: excerpt_body(&body),
        })
    }
}

#[async_trait]
impl ReviewApi for GithubClient {
    async fn list_comments(&self, repo: &RepoId, number: u64) -> Result<Vec<Comment>> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments?per_page=100",
            repo.owner, repo.name, number
        );
        let response = self.request(Method::GET, &path).send().await?;
        let response = Self::expect_success(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_comment(&self, repo: &RepoId, comment_id: u64) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/issues/comments/{}",
            repo.owner, repo.name, comment_id
        );
        let response = self.request(Method::DELETE, &path).send().await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn create_comment(&self, repo: &RepoId, number: u64, body: &str) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            repo.owner, repo.name, number
        );
        let response = self
            .request(Method::POST, &path)
            .json(&CreateCommentRequest { body })
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn close_review(
        &self,
        repo: &RepoId,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<()> {
        let path = format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number);
        let response = self
            .request(Method::PATCH, &path)
            .json(&EditPullRequest {
                title,
                body,
                state: "closed",
            })
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

/// Truncate an API error body for inclusion in an error value.
fn excerpt_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_LEN {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(MAX_ERROR_BODY_LEN).collect();
    format!("{head}... (truncated)")
}
