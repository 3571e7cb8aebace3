//! Format-check stage: every source file must match its canonical
//! rendering.

use crate::config::BotConfig;
use crate::diagnostic::{Diagnostic, StageOutcome};
use crate::error::Result;
use crate::parse;
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};

/// Message attached to files that differ from the canonical rendering.
pub const NEEDS_FORMAT: &str = "needs rustfmt";

/// Check every file, one diagnostic per malformed file.
pub async fn run(
    workspace: &Workspace,
    config: &BotConfig,
    files: &[PathBuf],
) -> Result<StageOutcome> {
    let mut diagnostics = Vec::new();
    for file in files {
        if let Some(diagnostic) = check_file(workspace, config, file).await? {
            diagnostics.push(diagnostic);
        }
    }
    Ok(StageOutcome::with(diagnostics))
}

/// Compare one file against the formatter's rendering of it.
///
/// A formatter exit failure means the file does not parse; its error text
/// becomes the diagnostic. When the rendering differs the first added line
/// of the rendering locates the finding, recovered from a line diff against
/// a transient `<file>.fmt` sibling that is always removed again.
async fn check_file(
    workspace: &Workspace,
    config: &BotConfig,
    file: &Path,
) -> Result<Option<Diagnostic>> {
    let original = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) => {
            return Ok(Some(Diagnostic::workspace(format!(
                "{}: {e}",
                file.display()
            ))))
        }
    };

    let mut argv = config.commands.fmt.clone();
    argv.push(file.to_string_lossy().to_string());
    let out = workspace
        .toolchain()
        .run("fmt", &argv, workspace.root())
        .await?;

    if !out.success() {
        let message = if out.stderr.trim().is_empty() {
            format!(
                "{}: formatter exited with status {}",
                file.display(),
                out.exit_code
            )
        } else {
            out.stderr
        };
        return Ok(Some(Diagnostic::workspace(message)));
    }

    let rendered = out.stdout;
    if rendered == original {
        return Ok(None);
    }

    let sibling = sibling_path(file);
    tokio::fs::write(&sibling, &rendered).await?;
    let line = parse::first_added_line(&original, &rendered);
    if let Err(e) = tokio::fs::remove_file(&sibling).await {
        tracing::debug!(path = %sibling.display(), error = %e, "could not remove rendering sibling");
    }

    Ok(Some(match line {
        Some(line) => Diagnostic::located(file, line, NEEDS_FORMAT),
        None => Diagnostic::file_level(file, NEEDS_FORMAT),
    }))
}

fn sibling_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".fmt");
    PathBuf::from(name)
}
