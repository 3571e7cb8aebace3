//! Source fetching: shallow single-branch checkout of the head revision.

use crate::error::{Result, RevetError};
use crate::event::GitReference;
use crate::workspace::Workspace;

/// Clone the head repository at the head ref into the workspace root.
///
/// The checkout is shallow and single-branch; when the head ref is not the
/// configured default branch a local branch pointer with that name is
/// created at the checked-out commit, since build tooling may assume the
/// default branch resolves even in a single-branch checkout. Clone failures
/// are returned to the caller, which treats them as a degraded (empty-tree)
/// run rather than an abort.
pub async fn clone_head(
    workspace: &Workspace,
    head: &GitReference,
    default_branch: &str,
) -> Result<()> {
    let root = workspace.root();
    let parent = root.parent().unwrap_or(root);

    let argv = vec![
        "git".to_string(),
        "clone".to_string(),
        "--quiet".to_string(),
        "--depth".to_string(),
        "1".to_string(),
        "--single-branch".to_string(),
        "-b".to_string(),
        head.ref_name.clone(),
        // the URL is payload-controlled and must not reach option parsing
        "--".to_string(),
        head.repo.clone_url.clone(),
        root.to_string_lossy().to_string(),
    ];
    let out = workspace.toolchain().run("clone", &argv, parent).await?;
    if !out.success() {
        return Err(RevetError::Git(format!(
            "clone of {} at {} failed: {}",
            head.repo.clone_url,
            head.ref_name,
            out.stderr.trim()
        )));
    }

    if head.ref_name != default_branch {
        let argv = vec![
            "git".to_string(),
            "branch".to_string(),
            default_branch.to_string(),
        ];
        let out = workspace.toolchain().run("branch", &argv, root).await?;
        if !out.success() {
            tracing::warn!(
                branch = default_branch,
                stderr = %out.stderr.trim(),
                "could not create default branch pointer"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Owner, Repository};
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_origin_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        std::fs::write(dir.path().join("lib.rs"), "pub fn one() -> u32 { 1 }\n").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "initial"]);
        run_git(dir.path(), &["checkout", "-b", "feature"]);
        std::fs::write(dir.path().join("two.rs"), "pub fn two() -> u32 { 2 }\n").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "feature work"]);
        dir
    }

    fn head_of(origin: &Path, branch: &str) -> GitReference {
        GitReference {
            label: format!("origin:{branch}"),
            ref_name: branch.to_string(),
            sha: "0000000000000000000000000000000000000000".to_string(),
            repo: Repository {
                id: 1,
                name: "origin".to_string(),
                clone_url: origin.to_string_lossy().to_string(),
                owner: Owner {
                    login: "tester".to_string(),
                    kind: "User".to_string(),
                },
            },
        }
    }

    fn branch_resolves(root: &Path, branch: &str) -> bool {
        StdCommand::new("git")
            .args(["rev-parse", "--verify", branch])
            .current_dir(root)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_clone_head_checks_out_branch_and_default_pointer() {
        let origin = make_origin_repo();
        let scratch = tempfile::tempdir().unwrap();
        let ws = Workspace::open_local(scratch.path().join("checkout"));

        clone_head(&ws, &head_of(origin.path(), "feature"), "main")
            .await
            .unwrap();

        assert!(ws.root().join("two.rs").exists());
        assert!(branch_resolves(ws.root(), "feature"));
        assert!(branch_resolves(ws.root(), "main"), "synthetic default branch");
    }

    #[tokio::test]
    async fn test_clone_head_skips_pointer_when_ref_is_default() {
        let origin = make_origin_repo();
        let scratch = tempfile::tempdir().unwrap();
        let ws = Workspace::open_local(scratch.path().join("checkout"));

        clone_head(&ws, &head_of(origin.path(), "feature"), "feature")
            .await
            .unwrap();

        assert!(ws.root().join("two.rs").exists());
        assert!(branch_resolves(ws.root(), "feature"));
    }

    #[tokio::test]
    async fn test_clone_failure_is_reported() {
        let scratch = tempfile::tempdir().unwrap();
        let ws = Workspace::open_local(scratch.path().join("checkout"));
        let missing = scratch.path().join("no-such-origin");

        let err = clone_head(&ws, &head_of(&missing, "feature"), "main")
            .await
            .unwrap_err();
        assert!(matches!(err, RevetError::Git(_)));
        assert!(ws.source_files().is_empty(), "degrades to an empty tree");
    }

    #[tokio::test]
    async fn test_dash_led_url_is_taken_as_a_repository() {
        let scratch = tempfile::tempdir().unwrap();
        let ws = Workspace::open_local(scratch.path().join("checkout"));

        let head = head_of(Path::new("--upload-pack=true"), "feature");
        let err = clone_head(&ws, &head, "main").await.unwrap_err();
        assert!(matches!(err, RevetError::Git(_)));
        assert!(
            err.to_string()
                .contains("repository '--upload-pack=true' does not exist"),
            "git must reject the value as a repository, not parse it: {err}"
        );
    }
}
