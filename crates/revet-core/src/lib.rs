//! Revet Core Library
//!
//! Everything the review daemon needs to take a pull-request event through
//! clone, pipeline, and reporting. Re-exported flat for programmatic use.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod event;
pub mod fakes;
pub mod fetch;
pub mod github;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod review;
pub mod stages;
pub mod telemetry;
pub mod toolchain;
pub mod workspace;

pub use config::{AnalyzerFormat, BotConfig, GatePolicy, StageCommands};

pub use diagnostic::{Diagnostic, PipelineReport, StageOutcome};

pub use error::{Result, RevetError};

pub use event::{
    GitReference, Owner, PullRequest, PullRequestEvent, RepoId, Repository, ReviewAction,
    ReviewState,
};

pub use github::{Comment, CommentAuthor, GithubClient, ReviewApi, DEFAULT_API_BASE};

pub use report::{render_comment, ReportManager};

pub use review::ReviewBot;

pub use telemetry::init_tracing;

pub use toolchain::{CommandOutput, Toolchain};

pub use workspace::{checkout_root, Workspace};

/// Revet version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
