//! Pipeline controller: ordered stage execution and diagnostic
//! normalization.

use crate::config::{BotConfig, GatePolicy};
use crate::diagnostic::PipelineReport;
use crate::error::Result;
use crate::stages;
use crate::workspace::Workspace;
use std::path::Path;

/// Run every stage over the workspace and aggregate the diagnostics.
///
/// Stage order is a contract: format findings come first because they are
/// cheapest to fix and likeliest to drown out other tool output, then
/// analysis, then build, then test. When the workspace holds no source
/// files at all (including a failed clone) no tool is invoked and the
/// report is empty.
pub async fn run(workspace: &Workspace, config: &BotConfig) -> Result<PipelineReport> {
    let files = workspace.source_files();
    if files.is_empty() {
        tracing::info!(
            root = %workspace.root().display(),
            "no source files to review"
        );
        return Ok(PipelineReport::default());
    }
    tracing::info!(files = files.len(), "running review pipeline");

    let mut diagnostics = Vec::new();

    let fmt = stages::fmt::run(workspace, config, &files).await?;
    diagnostics.extend(fmt.diagnostics);

    let analysis = stages::analyze::run(workspace, config).await?;
    diagnostics.extend(analysis.diagnostics);

    let run_build = match config.gate_policy {
        GatePolicy::BuildGatesTest => true,
        GatePolicy::FindingsGateBuild => diagnostics.is_empty(),
    };

    if run_build {
        let build = stages::build::run(workspace, config).await?;
        let build_passed = build.proceed;
        diagnostics.extend(build.diagnostics);

        if build_passed {
            let test = stages::test::run(workspace, config).await?;
            diagnostics.extend(test.diagnostics);
        }
    }

    let mut report = PipelineReport { diagnostics };
    normalize(&mut report, workspace.root());
    Ok(report)
}

/// Rewrite diagnostic files relative to the workspace root and scrub the
/// root path out of every message so comments never leak local layout.
fn normalize(report: &mut PipelineReport, root: &Path) {
    let root_text = root.to_string_lossy().to_string();
    for diagnostic in &mut report.diagnostics {
        if let Some(file) = diagnostic.file.take() {
            let file = match file.strip_prefix(root) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => file,
            };
            diagnostic.file = Some(file);
        }
        diagnostic.message = diagnostic.message.replace(&root_text, "");
    }
}
