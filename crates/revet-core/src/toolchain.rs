//! External command execution with per-run toolchain isolation.
//!
//! Concurrent runs must never share build state, so every command a run
//! spawns carries an explicit environment: a cargo cache shared across runs
//! (safe, the tool locks it) and a strictly per-run artifact directory.
//! Nothing here mutates the process environment.

use crate::error::{Result, RevetError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout followed by stderr, for transcript diagnostics.
    pub fn transcript(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }
}

/// Toolchain paths threaded into every command of one run.
#[derive(Debug, Clone)]
pub struct Toolchain {
    cargo_home: Option<PathBuf>,
    target_dir: Option<PathBuf>,
}

impl Toolchain {
    /// Isolated toolchain: shared download cache, per-run artifact dir.
    pub fn isolated(cargo_home: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            cargo_home: Some(cargo_home.into()),
            target_dir: Some(target_dir.into()),
        }
    }

    /// Inherit the ambient toolchain paths (local one-shot runs).
    pub fn inherited() -> Self {
        Self {
            cargo_home: None,
            target_dir: None,
        }
    }

    fn command(&self, program: &str) -> Command {
        let mut cmd = Command::new(program);
        if let Some(home) = &self.cargo_home {
            cmd.env("CARGO_HOME", home);
        }
        if let Some(target) = &self.target_dir {
            cmd.env("CARGO_TARGET_DIR", target);
        }
        cmd
    }

    /// Run `argv` in `cwd`, capturing output.
    ///
    /// A nonzero exit is a normal result; only spawn failures (missing
    /// binary, unreadable cwd) are errors.
    pub async fn run(&self, stage: &str, argv: &[String], cwd: &Path) -> Result<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RevetError::EmptyCommand(stage.to_string()))?;

        let start = Instant::now();
        let child = self
            .command(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RevetError::ToolLaunch {
                program: program.clone(),
                source,
            })?;

        let output = child.wait_with_output().await?;
        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        tracing::debug!(
            stage,
            program = %program,
            exit_code = result.exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );
        Ok(result)
    }
}
