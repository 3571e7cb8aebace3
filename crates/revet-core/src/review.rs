//! Top-level review orchestration: one pull-request event end to end.

use std::sync::Arc;

use crate::config::BotConfig;
use crate::diagnostic::PipelineReport;
use crate::error::Result;
use crate::event::PullRequestEvent;
use crate::fetch;
use crate::github::ReviewApi;
use crate::pipeline;
use crate::report::ReportManager;
use crate::workspace::Workspace;

/// The bot: a configuration plus a hosting-API client.
///
/// One instance serves every delivery; each event gets its own isolated
/// workspace, so concurrent reviews of different head revisions do not
/// interfere.
pub struct ReviewBot {
    config: BotConfig,
    api: Arc<dyn ReviewApi>,
}

impl ReviewBot {
    pub fn new(config: BotConfig, api: Arc<dyn ReviewApi>) -> Self {
        Self { config, api }
    }

    /// Entry point for one delivered event.
    ///
    /// Errors are logged rather than propagated: a failed run must never
    /// take the daemon down or poison other deliveries.
    pub async fn handle_event(&self, event: &PullRequestEvent) {
        if !event.action.triggers_review() {
            tracing::debug!(
                number = event.number,
                action = ?event.action,
                "ignoring non-trigger action"
            );
            return;
        }
        tracing::info!(
            number = event.number,
            action = ?event.action,
            head = %event.pull_request.head.sha,
            "starting review"
        );
        match self.run_review(event).await {
            Ok(report) => tracing::info!(
                number = event.number,
                findings = report.failed_count(),
                "review finished"
            ),
            Err(e) => tracing::error!(number = event.number, error = %e, "review aborted"),
        }
    }

    /// Run the full review: provision, clone, pipeline, report, settle.
    ///
    /// A clone failure degrades to reviewing an empty tree instead of
    /// aborting; so do comment cleanup and posting failures. Stage-launch
    /// failures and the final settle are load-bearing and propagate.
    pub async fn run_review(&self, event: &PullRequestEvent) -> Result<PipelineReport> {
        let pr = &event.pull_request;
        let workspace = Workspace::provision(&self.config, &pr.base.repo.clone_url, &pr.head.sha)?;

        if let Err(e) = fetch::clone_head(&workspace, &pr.head, &self.config.default_branch).await {
            tracing::warn!(error = %e, "clone failed, reviewing an empty tree");
        }

        let report = pipeline::run(&workspace, &self.config).await?;

        let manager = ReportManager::new(Arc::clone(&self.api), &self.config);
        if let Err(e) = manager.clean_old_comments(event).await {
            tracing::warn!(error = %e, "could not clean previous comments");
        }
        if let Err(e) = manager.report(event, &report).await {
            tracing::warn!(error = %e, "could not post review comment");
        }
        manager.finalize(event, &report, &workspace).await?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerFormat;
    use crate::event::{GitReference, Owner, PullRequest, Repository, ReviewAction, ReviewState};
    use crate::fakes::MemoryReviewApi;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_origin_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["checkout", "-b", "feature"]);
        std::fs::write(dir.path().join("lib.rs"), "pub fn one() -> u32 { 1 }\n").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "feature work"]);
        dir
    }

    fn event_for(action: ReviewAction, head_clone_url: &str, sha: &str) -> PullRequestEvent {
        let repo = |clone_url: &str, login: &str| Repository {
            id: 1,
            name: "widgets".to_string(),
            clone_url: clone_url.to_string(),
            owner: Owner {
                login: login.to_string(),
                kind: "User".to_string(),
            },
        };
        PullRequestEvent {
            action,
            number: 7,
            pull_request: PullRequest {
                url: "https://api.github.com/repos/acme/widgets/pulls/7".to_string(),
                state: ReviewState::Open,
                title: "Add widget".to_string(),
                body: Some("please review".to_string()),
                base: GitReference {
                    label: "acme:main".to_string(),
                    ref_name: "main".to_string(),
                    sha: "1111111111111111111111111111111111111111".to_string(),
                    repo: repo("https://github.com/acme/widgets.git", "acme"),
                },
                head: GitReference {
                    label: "fork:feature".to_string(),
                    ref_name: "feature".to_string(),
                    sha: sha.to_string(),
                    repo: repo(head_clone_url, "fork"),
                },
            },
        }
    }

    /// Commands that touch no real toolchain: identity formatter, silent
    /// analyzer, passing build, chatty test run.
    fn passing_config(scratch: &Path) -> BotConfig {
        let mut config = BotConfig::new("revet-bot");
        config.scratch_root = scratch.to_path_buf();
        config.analyzer_format = AnalyzerFormat::Lines;
        config.commands.fmt = vec!["cat".to_string()];
        config.commands.analyze = vec!["true".to_string()];
        config.commands.build = vec!["true".to_string()];
        config.commands.test = vec!["echo".to_string(), "ok".to_string()];
        config
    }

    #[tokio::test]
    async fn test_passing_review_posts_report_and_reclaims_workspace() {
        let origin = make_origin_repo();
        let scratch = tempfile::tempdir().unwrap();
        let config = passing_config(scratch.path());
        let api = Arc::new(MemoryReviewApi::new("revet-bot"));
        let bot = ReviewBot::new(config, api.clone());

        let event = event_for(
            ReviewAction::Opened,
            &origin.path().to_string_lossy(),
            "feedface",
        );
        let report = bot.run_review(&event).await.unwrap();

        assert!(report.all_passed());
        let comments = api.comments_for(7);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "```\nok\n```");
        assert!(api.closed_reviews().is_empty());
        assert!(
            !scratch.path().join("feedface").exists(),
            "workspace reclaimed on success"
        );
    }

    #[tokio::test]
    async fn test_failing_review_replaces_comment_retains_workspace_and_closes() {
        let origin = make_origin_repo();
        let scratch = tempfile::tempdir().unwrap();
        let mut config = passing_config(scratch.path());
        config.commands.build = vec!["false".to_string()];
        let api = Arc::new(MemoryReviewApi::new("revet-bot"));
        api.seed_comment(7, "revet-bot", "stale report from an older head");
        api.seed_comment(7, "human", "looks good to me");
        let bot = ReviewBot::new(config, api.clone());

        let event = event_for(
            ReviewAction::Synchronize,
            &origin.path().to_string_lossy(),
            "cafebabe",
        );
        let report = bot.run_review(&event).await.unwrap();

        assert!(!report.all_passed());
        let comments = api.comments_for(7);
        assert_eq!(comments.len(), 2, "stale bot comment replaced, human kept");
        assert!(comments.iter().any(|c| c.user.login == "human"));
        let bot_comment = comments
            .iter()
            .find(|c| c.user.login == "revet-bot")
            .unwrap();
        assert!(bot_comment.body.contains("build failed with exit status 1"));

        let closed = api.closed_reviews();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].title, "Add widget");
        assert_eq!(closed[0].body, "please review");
        assert!(
            scratch.path().join("cafebabe").exists(),
            "workspace retained on failure"
        );
    }

    #[tokio::test]
    async fn test_unclonable_head_degrades_to_vacuous_success() {
        let scratch = tempfile::tempdir().unwrap();
        let config = passing_config(scratch.path());
        let api = Arc::new(MemoryReviewApi::new("revet-bot"));
        let bot = ReviewBot::new(config, api.clone());

        let missing = scratch.path().join("no-such-origin");
        let event = event_for(ReviewAction::Opened, &missing.to_string_lossy(), "badc10e");
        let report = bot.run_review(&event).await.unwrap();

        assert!(report.is_empty());
        assert!(api.comments_for(7).is_empty(), "nothing to report");
        assert!(api.closed_reviews().is_empty());
        assert!(!scratch.path().join("badc10e").exists());
    }

    #[tokio::test]
    async fn test_non_trigger_action_does_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let config = passing_config(scratch.path());
        let api = Arc::new(MemoryReviewApi::new("revet-bot"));
        let bot = ReviewBot::new(config, api.clone());

        let event = event_for(ReviewAction::Closed, "https://github.com/x/y.git", "feedface");
        bot.handle_event(&event).await;

        assert!(api.comments_for(7).is_empty());
        assert!(!scratch.path().join("feedface").exists(), "no provisioning");
    }
}
