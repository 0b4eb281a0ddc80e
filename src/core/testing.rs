//! Scratch repositories for unit tests

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use crate::core::context::Context;
use crate::core::git::Git;
use crate::core::settings::Settings;

/// Run git in `dir`, panicking on failure
pub(crate) fn run_git(dir: &Path, args: &[&str]) -> String {
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

/// Initialize a repository with a local identity, then turn it into storage
pub(crate) fn init_repo(path: &Path) -> Git {
    std::fs::create_dir_all(path).unwrap();
    run_git(path, &["init", "-q"]);
    run_git(path, &["config", "user.email", "test@example.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
    run_git(path, &["config", "commit.gpgsign", "false"]);
    Git::init_storage(path).unwrap()
}

/// A fresh storage repository in a temp dir
pub(crate) fn scratch_repo() -> (TempDir, Git) {
    let tmp = tempfile::tempdir().unwrap();
    let git = init_repo(tmp.path());
    (tmp, git)
}

/// A context with storage and config file in a temp dir
pub(crate) fn scratch_context() -> (TempDir, Context) {
    let tmp = tempfile::tempdir().unwrap();
    let storage = tmp.path().join("storage");
    init_repo(&storage);
    let settings = Settings::new(storage, tmp.path().join("config.yml"));
    let ctx = Context::open(settings).unwrap();
    (tmp, ctx)
}
