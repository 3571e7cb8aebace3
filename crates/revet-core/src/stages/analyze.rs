//! Static-analysis stage: one analyzer pass over the whole workspace.

use crate::config::{AnalyzerFormat, BotConfig};
use crate::diagnostic::{Diagnostic, StageOutcome};
use crate::error::Result;
use crate::parse;
use crate::workspace::Workspace;

/// Run the analyzer at the workspace root and parse its findings.
///
/// The whole workspace is analyzed in one invocation so cross-file issues
/// surface. A nonzero exit is the normal signal that findings exist; an
/// analyzer that exits nonzero without any parseable finding gets its
/// transcript reported instead, so a crashing analyzer is never silent.
pub async fn run(workspace: &Workspace, config: &BotConfig) -> Result<StageOutcome> {
    let out = workspace
        .toolchain()
        .run("analyze", &config.commands.analyze, workspace.root())
        .await?;

    let mut diagnostics = match config.analyzer_format {
        AnalyzerFormat::CargoJson => parse::cargo_json_diagnostics(&out.stdout),
        AnalyzerFormat::Lines => parse::line_diagnostics(&out.transcript()),
    };

    if diagnostics.is_empty() && !out.success() {
        let transcript = out.transcript();
        let message = if transcript.trim().is_empty() {
            format!("analyzer exited with status {}", out.exit_code)
        } else {
            transcript
        };
        diagnostics.push(Diagnostic::workspace(message));
    }

    Ok(StageOutcome::with(diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevetError;
    use std::path::PathBuf;

    fn local_workspace(dir: &tempfile::TempDir) -> Workspace {
        Workspace::open_local(dir.path())
    }

    fn config_with_analyze(parts: &[&str], format: AnalyzerFormat) -> BotConfig {
        let mut config = BotConfig::new("revet-bot");
        config.commands.analyze = parts.iter().map(|s| s.to_string()).collect();
        config.analyzer_format = format;
        config
    }

    #[tokio::test]
    async fn test_lines_mode_parses_findings() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_analyze(
            &[
                "sh",
                "-c",
                "printf 'src/a.rs:3: suspicious shift\\nanalyzer done\\n'; exit 1",
            ],
            AnalyzerFormat::Lines,
        );
        let outcome = run(&local_workspace(&dir), &config).await.unwrap();
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].file, Some(PathBuf::from("src/a.rs")));
        assert_eq!(outcome.diagnostics[0].line, Some(3));
        assert_eq!(outcome.diagnostics[0].message, "suspicious shift");
        assert!(outcome.proceed);
    }

    #[tokio::test]
    async fn test_cargo_json_mode_parses_findings() {
        let dir = tempfile::tempdir().unwrap();
        let message = r#"{"reason":"compiler-message","message":{"message":"unused import: `std::fs`","level":"warning","spans":[{"file_name":"src/lib.rs","line_start":1,"is_primary":true}]}}"#;
        let config = config_with_analyze(
            &["sh", "-c", &format!("echo '{message}'")],
            AnalyzerFormat::CargoJson,
        );
        let outcome = run(&local_workspace(&dir), &config).await.unwrap();
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].line, Some(1));
        assert_eq!(outcome.diagnostics[0].message, "unused import: `std::fs`");
    }

    #[tokio::test]
    async fn test_clean_run_has_no_findings() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_analyze(&["true"], AnalyzerFormat::CargoJson);
        let outcome = run(&local_workspace(&dir), &config).await.unwrap();
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_crashing_analyzer_reports_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_analyze(
            &["sh", "-c", "echo 'error: no such subcommand' >&2; exit 101"],
            AnalyzerFormat::CargoJson,
        );
        let outcome = run(&local_workspace(&dir), &config).await.unwrap();
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].file.is_none());
        assert!(outcome.diagnostics[0].message.contains("no such subcommand"));
    }

    #[tokio::test]
    async fn test_missing_analyzer_binary_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_analyze(&["definitely-not-a-real-analyzer"], AnalyzerFormat::Lines);
        let err = run(&local_workspace(&dir), &config).await.unwrap_err();
        assert!(matches!(err, RevetError::ToolLaunch { .. }));
    }
}
