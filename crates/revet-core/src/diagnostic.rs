//! The shared diagnostic model every stage reports through.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One reportable finding.
///
/// `file` is relative to the workspace root once the pipeline controller
/// has aggregated a run; stages may fill in absolute paths. A diagnostic
/// with neither file nor line is a workspace-wide message, e.g. a build
/// transcript. `passed` diagnostics are still shown to the author but never
/// count against the run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// File the finding is anchored to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// 1-based line number, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Finding text; may span multiple lines for transcripts.
    pub message: String,

    /// Whether this finding counts as passing output.
    pub passed: bool,
}

impl Diagnostic {
    /// Failed finding anchored to a file and line.
    pub fn located(file: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: Some(line),
            message: message.into(),
            passed: false,
        }
    }

    /// Failed finding anchored to a file without a usable line number.
    pub fn file_level(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            line: None,
            message: message.into(),
            passed: false,
        }
    }

    /// Failed workspace-wide finding (tool crash, failure transcript).
    pub fn workspace(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
            passed: false,
        }
    }

    /// Passing workspace-wide output, e.g. a test transcript with coverage.
    pub fn passing(message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
            passed: true,
        }
    }

    /// The comment line for this diagnostic, or `None` if there is nothing
    /// worth showing (no location and an empty message).
    pub fn render_line(&self) -> Option<String> {
        let message = self.message.trim();
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}: {}", file.display(), line, message)),
            (Some(file), None) => Some(format!("{}: {}", file.display(), message)),
            (None, _) if !message.is_empty() => Some(message.to_string()),
            _ => None,
        }
    }
}

/// What one stage produced, plus whether later stages should run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Findings in the order the stage produced them.
    pub diagnostics: Vec<Diagnostic>,

    /// `false` short-circuits the remaining stages.
    pub proceed: bool,
}

impl StageOutcome {
    /// No findings, keep going.
    pub fn none() -> Self {
        Self {
            diagnostics: Vec::new(),
            proceed: true,
        }
    }

    /// Findings, keep going.
    pub fn with(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            proceed: true,
        }
    }

    /// Findings, skip the remaining gated stages.
    pub fn halting(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            proceed: false,
        }
    }
}

/// Ordered concatenation of every executed stage's diagnostics for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl PipelineReport {
    /// True when every diagnostic passed; vacuously true when empty.
    pub fn all_passed(&self) -> bool {
        self.diagnostics.iter().all(|d| d.passed)
    }

    /// Number of failed diagnostics.
    pub fn failed_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.passed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
