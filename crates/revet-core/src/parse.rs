//! Parsers turning raw tool output into diagnostics.
//!
//! Two analyzer formats are supported: the structured cargo JSON message
//! stream (default) and plain `file:line: message` lines for analyzers
//! without a machine-readable mode. Unparseable lines are dropped, never
//! fatal; the surviving lines are the report.

use crate::diagnostic::Diagnostic;
use serde::Deserialize;
use similar::{ChangeTag, TextDiff};

/// Parse plain `file:line: message` analyzer output.
///
/// Each line splits once on `": "` into location and message; lines without
/// the separator (banners, summaries) are dropped. The location splits on
/// `:` and needs at least a file and a line field; a line field that is not
/// a positive integer keeps the finding file-attributed but unlocated.
pub fn line_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for raw in output.lines() {
        let Some((location, message)) = raw.split_once(": ") else {
            continue;
        };
        let mut fields = location.split(':');
        let Some(file) = fields.next() else {
            continue;
        };
        let Some(line_field) = fields.next() else {
            continue;
        };
        let line = line_field.parse::<u32>().ok().filter(|n| *n > 0);

        let diagnostic = if file.is_empty() {
            Diagnostic::workspace(message)
        } else if let Some(line) = line {
            Diagnostic::located(file, line, message)
        } else {
            Diagnostic::file_level(file, message)
        };
        diagnostics.push(diagnostic);
    }
    diagnostics
}

/// One line of `--message-format=json` output.
#[derive(Debug, Deserialize)]
struct CargoLine {
    reason: String,
    message: Option<CompilerMessage>,
}

/// Compiler message payload.
#[derive(Debug, Deserialize)]
struct CompilerMessage {
    message: String,
    level: String,
    spans: Vec<DiagnosticSpan>,
}

/// Source span of a compiler message.
#[derive(Debug, Deserialize)]
struct DiagnosticSpan {
    file_name: String,
    line_start: u32,
    is_primary: bool,
}

/// Parse a cargo JSON compiler-message stream.
///
/// Keeps `error` and `warning` messages anchored at their primary span.
/// Notes, help messages, span-less summaries ("3 warnings emitted",
/// "aborting due to previous error") and every non-message record are
/// dropped, as are lines that are not JSON at all. Repeats of the same
/// finding (one per compilation target) collapse to one diagnostic.
pub fn cargo_json_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for raw in output.lines() {
        if !raw.trim_start().starts_with('{') {
            continue;
        }
        let Ok(line) = serde_json::from_str::<CargoLine>(raw) else {
            continue;
        };
        if line.reason != "compiler-message" {
            continue;
        }
        let Some(message) = line.message else {
            continue;
        };
        if message.level != "error" && message.level != "warning" {
            continue;
        }
        let Some(span) = message
            .spans
            .iter()
            .find(|s| s.is_primary)
            .or_else(|| message.spans.first())
        else {
            continue;
        };

        let diagnostic = Diagnostic::located(&span.file_name, span.line_start, message.message);
        if !diagnostics.contains(&diagnostic) {
            diagnostics.push(diagnostic);
        }
    }
    diagnostics
}

/// First line number the rendered text adds relative to the original.
///
/// Line numbers are 1-based positions in the rendered text. Returns `None`
/// when the rendering only removes lines.
pub fn first_added_line(original: &str, rendered: &str) -> Option<u32> {
    let diff = TextDiff::from_lines(original, rendered);
    for change in diff.iter_all_changes() {
        if change.tag() == ChangeTag::Insert {
            if let Some(index) = change.new_index() {
                return Some(index as u32 + 1);
            }
        }
    }
    None
}
