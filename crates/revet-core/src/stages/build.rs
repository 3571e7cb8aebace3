//! Build stage: whole-workspace build gating the test stage.

use crate::config::BotConfig;
use crate::diagnostic::{Diagnostic, StageOutcome};
use crate::error::Result;
use crate::workspace::Workspace;

/// Build the workspace.
///
/// Success proceeds silently. Failure emits exactly one unlocated
/// diagnostic holding the full transcript (per-line attribution of build
/// errors is deliberately not attempted, the transcript is the unit of
/// truth) and stops the pipeline short of the test stage.
pub async fn run(workspace: &Workspace, config: &BotConfig) -> Result<StageOutcome> {
    let out = workspace
        .toolchain()
        .run("build", &config.commands.build, workspace.root())
        .await?;

    if out.success() {
        return Ok(StageOutcome::none());
    }

    let transcript = out.transcript();
    let message = if transcript.trim().is_empty() {
        format!("build failed with exit status {}", out.exit_code)
    } else {
        transcript
    };
    Ok(StageOutcome::halting(vec![Diagnostic::workspace(message)]))
}
