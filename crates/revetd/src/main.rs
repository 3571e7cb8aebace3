//! revetd: the automated review daemon.
//!
//! ## Commands
//!
//! - `serve`: accept pull-request webhook deliveries and review each one
//! - `check`: run the review pipeline over a local checkout and print findings

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use clap::{Parser, Subcommand};
use tracing::Level;

use revet_core::{
    pipeline, AnalyzerFormat, BotConfig, GatePolicy, GithubClient, PullRequestEvent, ReviewBot,
    Workspace,
};

#[derive(Parser)]
#[command(name = "revetd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Automated code review for pull requests", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for webhook deliveries and review each pull request
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:1980")]
        listen: String,

        /// API token the bot authenticates with
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Login the bot comments under
        #[arg(long, env = "REVET_BOT_USER")]
        bot_user: String,

        /// Directory holding per-revision workspaces
        #[arg(long)]
        scratch_root: Option<PathBuf>,

        /// Branch name downstream tooling expects to resolve
        #[arg(long, default_value = "main")]
        default_branch: String,

        /// Host whose clone URLs drop a trailing .git in workspace paths
        #[arg(long, default_value = "github.com")]
        canonical_host: String,

        /// Gating policy: build-gates-test or findings-gate-build
        #[arg(long, default_value = "build-gates-test")]
        gate: String,

        /// Analyzer output format: cargo-json or lines
        #[arg(long, default_value = "cargo-json")]
        analyzer_format: String,

        /// Leave failing pull requests open
        #[arg(long)]
        no_close: bool,
    },

    /// Run the review pipeline over a local checkout and print findings
    Check {
        /// Checkout to review (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Gating policy: build-gates-test or findings-gate-build
        #[arg(long, default_value = "build-gates-test")]
        gate: String,

        /// Analyzer output format: cargo-json or lines
        #[arg(long, default_value = "cargo-json")]
        analyzer_format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    revet_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Serve {
            listen,
            token,
            bot_user,
            scratch_root,
            default_branch,
            canonical_host,
            gate,
            analyzer_format,
            no_close,
        } => {
            let mut config = BotConfig::new(bot_user);
            if let Some(root) = scratch_root {
                config.scratch_root = root;
            }
            config.default_branch = default_branch;
            config.canonical_host = canonical_host;
            config.gate_policy = parse_gate(&gate)?;
            config.analyzer_format = parse_analyzer_format(&analyzer_format)?;
            config.close_on_failure = !no_close;
            cmd_serve(&listen, &token, config).await
        }
        Commands::Check {
            path,
            gate,
            analyzer_format,
        } => {
            let mut config = BotConfig::new("revet-local");
            config.gate_policy = parse_gate(&gate)?;
            config.analyzer_format = parse_analyzer_format(&analyzer_format)?;
            cmd_check(&path, config).await
        }
    }
}

async fn cmd_serve(listen: &str, token: &str, config: BotConfig) -> Result<()> {
    let api = Arc::new(GithubClient::new(token)?);
    let bot = Arc::new(ReviewBot::new(config, api));

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("cannot listen on {listen}"))?;
    tracing::info!(addr = listen, "revetd listening");

    axum::serve(listener, router(bot))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated")?;
    Ok(())
}

async fn cmd_check(path: &Path, config: BotConfig) -> Result<()> {
    let root = std::fs::canonicalize(path)
        .with_context(|| format!("cannot resolve {}", path.display()))?;
    let workspace = Workspace::open_local(root);
    let report = pipeline::run(&workspace, &config).await?;

    for diagnostic in &report.diagnostics {
        if let Some(line) = diagnostic.render_line() {
            println!("{line}");
        }
    }
    if !report.all_passed() {
        std::process::exit(1);
    }
    tracing::info!("review passed");
    Ok(())
}

fn router(bot: Arc<ReviewBot>) -> Router {
    Router::new()
        .route("/", post(receive_delivery))
        .route("/healthz", get(healthz))
        .with_state(bot)
}

/// Accept one webhook delivery.
///
/// Pull-request payloads are acknowledged immediately and reviewed in a
/// background task so slow pipelines never stall the webhook sender.
/// Other event types are acknowledged and dropped.
async fn receive_delivery(
    State(bot): State<Arc<ReviewBot>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(kind) = headers.get("x-github-event").and_then(|v| v.to_str().ok()) else {
        tracing::warn!("delivery without an event type header");
        return StatusCode::BAD_REQUEST;
    };
    if kind != "pull_request" {
        tracing::debug!(kind, "acknowledging unhandled event type");
        return StatusCode::OK;
    }

    let event: PullRequestEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "undecodable pull-request payload");
            return StatusCode::BAD_REQUEST;
        }
    };
    tokio::spawn(async move {
        bot.handle_event(&event).await;
    });
    StatusCode::ACCEPTED
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("shutting down");
}

fn parse_gate(name: &str) -> Result<GatePolicy> {
    match name {
        "build-gates-test" => Ok(GatePolicy::BuildGatesTest),
        "findings-gate-build" => Ok(GatePolicy::FindingsGateBuild),
        other => bail!("unknown gate policy `{other}`"),
    }
}

fn parse_analyzer_format(name: &str) -> Result<AnalyzerFormat> {
    match name {
        "cargo-json" => Ok(AnalyzerFormat::CargoJson),
        "lines" => Ok(AnalyzerFormat::Lines),
        other => bail!("unknown analyzer format `{other}`"),
    }
}
