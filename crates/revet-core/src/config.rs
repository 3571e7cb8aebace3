//! Bot configuration and stage command tables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which upstream outcomes skip the build and test stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GatePolicy {
    /// Build and test always attempt; only a build failure skips test.
    BuildGatesTest,

    /// Any format or analysis finding skips build and test entirely.
    FindingsGateBuild,
}

impl Default for GatePolicy {
    fn default() -> Self {
        GatePolicy::BuildGatesTest
    }
}

/// How the analyzer's output is parsed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerFormat {
    /// A stream of cargo JSON compiler messages.
    CargoJson,

    /// Plain `file:line: message` lines.
    Lines,
}

impl Default for AnalyzerFormat {
    fn default() -> Self {
        AnalyzerFormat::CargoJson
    }
}

/// Commands run by the pipeline stages (first element is the executable).
///
/// The format command receives one source file path as an extra trailing
/// argument and must print the canonical rendering on stdout; the other
/// commands run once at the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCommands {
    /// Per-file canonical formatter.
    pub fmt: Vec<String>,

    /// Whole-workspace analyzer.
    pub analyze: Vec<String>,

    /// Whole-workspace build.
    pub build: Vec<String>,

    /// Whole-workspace test runner.
    pub test: Vec<String>,
}

impl Default for StageCommands {
    fn default() -> Self {
        Self {
            fmt: vec_of(&["rustfmt", "--edition", "2021", "--quiet", "--emit", "stdout"]),
            analyze: vec_of(&[
                "cargo",
                "clippy",
                "--workspace",
                "--all-targets",
                "--message-format=json",
            ]),
            build: vec_of(&["cargo", "build", "--workspace"]),
            test: vec_of(&["cargo", "test", "--workspace"]),
        }
    }
}

fn vec_of(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Process-wide bot configuration, built once and shared by every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Login the bot comments under; used to recognize its own comments.
    pub bot_login: String,

    /// Directory holding per-revision workspaces and the shared cargo cache.
    pub scratch_root: PathBuf,

    /// Branch name downstream tooling expects to resolve.
    pub default_branch: String,

    /// Host whose clone URLs drop a trailing `.git` in workspace paths.
    pub canonical_host: String,

    /// Stage gating policy.
    pub gate_policy: GatePolicy,

    /// Close the pull request when the run fails.
    pub close_on_failure: bool,

    /// Analyzer output parsing mode.
    pub analyzer_format: AnalyzerFormat,

    /// Stage command table.
    pub commands: StageCommands,
}

impl BotConfig {
    /// Configuration with production defaults for the given bot login.
    pub fn new(bot_login: impl Into<String>) -> Self {
        Self {
            bot_login: bot_login.into(),
            scratch_root: PathBuf::from("/tmp/revet"),
            default_branch: "main".to_string(),
            canonical_host: "github.com".to_string(),
            gate_policy: GatePolicy::default(),
            close_on_failure: true,
            analyzer_format: AnalyzerFormat::default(),
            commands: StageCommands::default(),
        }
    }
}
