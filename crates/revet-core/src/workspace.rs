//! Workspace provisioning: one isolated checkout per head revision.

use crate::config::BotConfig;
use crate::error::{Result, RevetError};
use crate::toolchain::Toolchain;
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::{DirEntry, WalkDir};

/// Checkout root for a clone URL and head revision.
///
/// Layout: `<scratch_root>/<revision>/src/<host>/<url path>`. A trailing
/// `.git` is stripped only when the host is the canonical hosting domain;
/// elsewhere a `.git`-suffixed repository name may be the real name.
pub fn checkout_root(
    scratch_root: &Path,
    canonical_host: &str,
    clone_url: &str,
    revision: &str,
) -> Result<PathBuf> {
    let parsed = Url::parse(clone_url).map_err(|e| RevetError::CloneUrl {
        url: clone_url.to_string(),
        reason: e.to_string(),
    })?;
    let host = parsed.host_str().ok_or_else(|| RevetError::CloneUrl {
        url: clone_url.to_string(),
        reason: "missing host".to_string(),
    })?;

    let mut repo_path = parsed.path().trim_matches('/').to_string();
    if host == canonical_host {
        if let Some(stripped) = repo_path.strip_suffix(".git") {
            repo_path = stripped.to_string();
        }
    }

    Ok(scratch_root
        .join(revision)
        .join("src")
        .join(host)
        .join(repo_path))
}

/// An isolated filesystem checkout owned by exactly one pipeline run.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    run_dir: PathBuf,
    toolchain: Toolchain,
}

impl Workspace {
    /// Provision the workspace for one head revision.
    ///
    /// Removes any directory left behind by a previous run of the same
    /// revision so the format stage never sees stale files, then prepares
    /// the parent chain the clone will land in.
    pub fn provision(config: &BotConfig, clone_url: &str, revision: &str) -> Result<Self> {
        let root = checkout_root(
            &config.scratch_root,
            &config.canonical_host,
            clone_url,
            revision,
        )?;
        let run_dir = config.scratch_root.join(revision);

        remove_tree(&run_dir)?;
        if let Some(parent) = root.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RevetError::Workspace {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let cargo_home = config.scratch_root.join("cargo");
        std::fs::create_dir_all(&cargo_home).map_err(|source| RevetError::Workspace {
            path: cargo_home.clone(),
            source,
        })?;

        let toolchain = Toolchain::isolated(cargo_home, run_dir.join("target"));
        Ok(Self {
            root,
            run_dir,
            toolchain,
        })
    }

    /// Wrap an existing directory without touching it, inheriting the
    /// ambient toolchain. Used by the local one-shot mode.
    pub fn open_local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            root: path.clone(),
            run_dir: path,
            toolchain: Toolchain::inherited(),
        }
    }

    /// Checkout root the stages operate on.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Per-revision directory holding the checkout and build artifacts.
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Every Rust source file under the root, in stable walk order.
    ///
    /// Directories whose name begins with `.` or `_` are skipped with their
    /// whole subtree. A missing root (failed clone) yields an empty list.
    pub fn source_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !skip_dir(entry))
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "rs")
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Remove the per-revision directory and everything under it.
    pub fn destroy(&self) -> Result<()> {
        remove_tree(&self.run_dir)
    }
}

fn skip_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_string_lossy()
        .starts_with(|c| c == '.' || c == '_')
}

fn remove_tree(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(RevetError::Workspace {
            path: path.to_path_buf(),
            source,
        }),
    }
}
