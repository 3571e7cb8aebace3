//! Report manager: idempotent comment protocol and the end-of-run
//! lifecycle decision.

use crate::config::BotConfig;
use crate::diagnostic::PipelineReport;
use crate::error::Result;
use crate::event::{PullRequestEvent, RepoId};
use crate::github::ReviewApi;
use crate::workspace::Workspace;
use std::sync::Arc;

/// Render the aggregate comment body, `None` when nothing is reportable.
///
/// One fenced code block so diagnostic text is never interpreted as
/// markdown, one line per diagnostic.
pub fn render_comment(report: &PipelineReport) -> Option<String> {
    let lines: Vec<String> = report
        .diagnostics
        .iter()
        .filter_map(|d| d.render_line())
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(format!("```\n{}\n```", lines.join("\n")))
}

/// Posts results back to the review and settles the workspace.
pub struct ReportManager {
    api: Arc<dyn ReviewApi>,
    bot_login: String,
    close_on_failure: bool,
}

impl ReportManager {
    pub fn new(api: Arc<dyn ReviewApi>, config: &BotConfig) -> Self {
        Self {
            api,
            bot_login: config.bot_login.clone(),
            close_on_failure: config.close_on_failure,
        }
    }

    /// Delete every comment the bot itself authored on this review.
    ///
    /// Runs before each report so repeated pushes replace the previous
    /// findings instead of stacking on them. A comment that fails to
    /// delete is skipped; the next run gets another chance at it.
    pub async fn clean_old_comments(&self, event: &PullRequestEvent) -> Result<()> {
        let repo = RepoId::from(&event.pull_request.base.repo);
        let comments = self.api.list_comments(&repo, event.number).await?;
        for comment in comments {
            if comment.user.login != self.bot_login {
                continue;
            }
            if let Err(e) = self.api.delete_comment(&repo, comment.id).await {
                tracing::warn!(
                    comment_id = comment.id,
                    error = %e,
                    "failed to delete stale comment"
                );
            }
        }
        Ok(())
    }

    /// Post the aggregate report as one comment; no-op when empty.
    pub async fn report(&self, event: &PullRequestEvent, report: &PipelineReport) -> Result<()> {
        let Some(body) = render_comment(report) else {
            tracing::debug!(number = event.number, "nothing to report");
            return Ok(());
        };
        let repo = RepoId::from(&event.pull_request.base.repo);
        self.api.create_comment(&repo, event.number, &body).await
    }

    /// Settle the run: reclaim the workspace on success, otherwise retain
    /// it for inspection and close the review (unless already closed or
    /// closing is disabled).
    pub async fn finalize(
        &self,
        event: &PullRequestEvent,
        report: &PipelineReport,
        workspace: &Workspace,
    ) -> Result<()> {
        if report.all_passed() {
            workspace.destroy()?;
            tracing::info!(number = event.number, "review passed, workspace reclaimed");
            return Ok(());
        }

        tracing::info!(
            number = event.number,
            failed = report.failed_count(),
            workspace = %workspace.root().display(),
            "review failed, workspace retained"
        );
        if !self.close_on_failure || event.pull_request.is_closed() {
            return Ok(());
        }

        let repo = RepoId::from(&event.pull_request.base.repo);
        let body = event.pull_request.body.as_deref().unwrap_or("");
        self.api
            .close_review(&repo, event.number, &event.pull_request.title, body)
            .await
    }
}
