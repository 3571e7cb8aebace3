//! In-memory fakes for the hosting API (testing only)
//!
//! Provides `MemoryReviewApi`, which satisfies the `ReviewApi` contract
//! without any network access and records enough state for assertions.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Result, RevetError};
use crate::event::RepoId;
use crate::github::{Comment, CommentAuthor, ReviewApi};

/// A review the fake saw closed, with the preserved title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedReview {
    pub number: u64,
    pub title: String,
    pub body: String,
}

#[derive(Default)]
struct ApiState {
    next_id: u64,
    comments: Vec<(u64, Comment)>,
    closed: Vec<ClosedReview>,
}

/// In-memory `ReviewApi` keyed by review number (single-repository).
///
/// Comments created through the trait are attributed to the configured
/// bot login, exactly like comments the real bot posts under its token.
pub struct MemoryReviewApi {
    bot_login: String,
    state: Mutex<ApiState>,
}

impl MemoryReviewApi {
    pub fn new(bot_login: impl Into<String>) -> Self {
        Self {
            bot_login: bot_login.into(),
            state: Mutex::new(ApiState::default()),
        }
    }

    /// Insert a pre-existing comment by any author.
    pub fn seed_comment(&self, number: u64, login: &str, body: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.comments.push((
            number,
            Comment {
                id,
                body: body.to_string(),
                user: CommentAuthor {
                    login: login.to_string(),
                },
                created_at: Utc::now(),
            },
        ));
        id
    }

    /// Comments currently attached to a review.
    pub fn comments_for(&self, number: u64) -> Vec<Comment> {
        let state = self.state.lock().unwrap();
        state
            .comments
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Reviews closed through the trait, in order.
    pub fn closed_reviews(&self) -> Vec<ClosedReview> {
        self.state.lock().unwrap().closed.clone()
    }
}

#[async_trait]
impl ReviewApi for MemoryReviewApi {
    async fn list_comments(&self, _repo: &RepoId, number: u64) -> Result<Vec<Comment>> {
        Ok(self.comments_for(number))
    }

    async fn delete_comment(&self, _repo: &RepoId, comment_id: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.comments.len();
        state.comments.retain(|(_, c)| c.id != comment_id);
        if state.comments.len() == before {
            return Err(RevetError::ApiStatus {
                status: 404,
                url: format!("memory://comments/{comment_id}"),
                body: "Not Found".to_string(),
            });
        }
        Ok(())
    }

    async fn create_comment(&self, _repo: &RepoId, number: u64, body: &str) -> Result<()> {
        self.seed_comment(number, &self.bot_login, body);
        Ok(())
    }

    async fn close_review(
        &self,
        _repo: &RepoId,
        number: u64,
        title: &str,
        body: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closed.push(ClosedReview {
            number,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
