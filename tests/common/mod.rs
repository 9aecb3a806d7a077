//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking on failure, and return trimmed stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Test helper: Create a temporary git repository on branch `main`
pub fn create_temp_git_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path();

    git(path, &["init", "--quiet"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);

    temp_dir
}

/// Repository with one commit so HEAD exists
pub fn create_repo_with_commit() -> TempDir {
    let temp_dir = create_temp_git_repo();
    std::fs::write(temp_dir.path().join("README.md"), "# test\n").unwrap();
    git(temp_dir.path(), &["add", "README.md"]);
    git(temp_dir.path(), &["commit", "--quiet", "-m", "Initial commit"]);
    temp_dir
}

/// Bare repository registered as `origin` of `repo`, with `main` pushed
pub fn attach_bare_remote(repo: &Path) -> TempDir {
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "--quiet", "--bare"]);
    let url = remote.path().to_string_lossy().to_string();
    git(repo, &["remote", "add", "origin", &url]);
    git(repo, &["push", "--quiet", "origin", "main"]);
    remote
}
