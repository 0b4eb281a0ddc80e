//! Git command abstraction layer
//!
//! Provides a safe interface for git operations without exposing shell commands directly.
//! All user input is passed via std::process::Command args.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Branch every storage repository is anchored on
pub const ANCHOR_BRANCH: &str = "master";

/// Marker file committed on the anchor branch
pub const MARKER_FILE: &str = "kood";

/// Git operations abstraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Git {
    repo_root: PathBuf,
}

/// Result of a git command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl GitOutput {
    /// Process exit status, -1 when the process was killed by a signal
    pub fn exit_status(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git command failed: {message}")]
    CommandFailed { message: String },

    #[error("Branch already exists: {branch}")]
    BranchExists { branch: String },

    #[error("Branch not found: {branch}")]
    BranchNotFound { branch: String },

    #[error("Git not installed or not in PATH")]
    GitNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Git {
    /// Create a new Git instance for the repository at the given path
    pub fn new(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
        }
    }

    /// Open the storage repository at `root`, creating it when missing.
    ///
    /// A fresh repository gets an anchor branch holding a single marker
    /// commit so that board branches always have somewhere to return to.
    pub fn init_storage(root: &Path) -> Result<Self, GitError> {
        std::fs::create_dir_all(root)?;
        let root = root.canonicalize()?;
        let git = Self::new(&root);

        if !root.join(".git").exists() {
            git.run_ok(&["init", "-q"])?;
        }

        if !git.has_commits() {
            git.run_ok(&[
                "symbolic-ref",
                "HEAD",
                &format!("refs/heads/{}", ANCHOR_BRANCH),
            ])?;
            std::fs::write(root.join(MARKER_FILE), "")?;
            git.run_ok(&["add", MARKER_FILE])?;
            git.run_ok(&["commit", "-q", "-m", "Initialize kood storage"])?;
            tracing::debug!(root = %root.display(), "initialized storage repository");
        }

        Ok(git)
    }

    /// Repository root this handle operates on
    pub fn root(&self) -> &Path {
        &self.repo_root
    }

    /// Execute a git command and return the output
    fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        tracing::debug!(
            command = %Self::format_command(args),
            root = %self.repo_root.display(),
            "running git"
        );

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GitError::GitNotFound
                } else {
                    GitError::IoError(e)
                }
            })?;

        Ok(GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            code: output.status.code(),
        })
    }

    /// Execute a git command that must succeed, returning its stdout
    fn run_ok(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.run(args)?;
        if output.success {
            Ok(output.stdout)
        } else {
            Err(GitError::CommandFailed {
                message: format!("{}: {}", Self::format_command(args), output.stderr),
            })
        }
    }

    /// Check if we're in a git repository
    pub fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--git-dir"])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// Check if HEAD points at a commit
    pub fn has_commits(&self) -> bool {
        self.run(&["rev-parse", "--verify", "-q", "HEAD"])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// Get current branch name, `None` when HEAD is detached
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let output = self.run(&["symbolic-ref", "--short", "-q", "HEAD"])?;
        if output.success {
            Ok(Some(output.stdout))
        } else if output.code == Some(1) {
            Ok(None)
        } else {
            Err(GitError::CommandFailed {
                message: output.stderr,
            })
        }
    }

    /// Check if `name` is the checked-out branch
    pub fn is_on_branch(&self, name: &str) -> Result<bool, GitError> {
        Ok(self.current_branch()?.as_deref() == Some(name))
    }

    /// Check if working directory is clean (no uncommitted changes)
    pub fn is_clean(&self) -> bool {
        self.run(&["status", "--porcelain"])
            .map(|o| o.success && o.stdout.is_empty())
            .unwrap_or(false)
    }

    /// Number of modified tracked files; untracked files are ignored
    pub fn change_count(&self) -> Result<usize, GitError> {
        let stdout = self.run_ok(&["status", "--porcelain", "--untracked-files=no"])?;
        Ok(stdout.lines().filter(|l| !l.trim().is_empty()).count())
    }

    /// Stash tracked modifications
    pub fn stash(&self) -> Result<(), GitError> {
        self.run_ok(&["stash", "push", "--quiet"]).map(|_| ())
    }

    /// Re-apply and drop the most recent stash entry
    pub fn stash_pop(&self) -> Result<(), GitError> {
        self.run_ok(&["stash", "pop", "--index", "--quiet"]).map(|_| ())
    }

    /// Number of stash entries
    pub fn stash_count(&self) -> Result<usize, GitError> {
        let stdout = self.run_ok(&["stash", "list"])?;
        Ok(stdout.lines().filter(|l| !l.is_empty()).count())
    }

    /// Check if a branch exists
    pub fn branch_exists(&self, name: &str) -> bool {
        self.run(&["rev-parse", "--verify", "-q", &format!("refs/heads/{}", name)])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// Check if a remote branch exists
    pub fn remote_branch_exists(&self, remote: &str, branch: &str) -> bool {
        self.run(&[
            "rev-parse",
            "--verify",
            "-q",
            &format!("refs/remotes/{}/{}", remote, branch),
        ])
        .map(|o| o.success)
        .unwrap_or(false)
    }

    /// Names of all local branches, sorted
    pub fn branches(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run_ok(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        let mut branches: Vec<String> = stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        branches.sort();
        Ok(branches)
    }

    /// Create a branch with no history, rooted at an empty-tree commit
    pub fn create_orphan_branch(&self, name: &str, message: &str) -> Result<(), GitError> {
        if self.branch_exists(name) {
            return Err(GitError::BranchExists {
                branch: name.to_string(),
            });
        }

        let tree = self.run_ok(&["mktree"])?;
        let commit = self.run_ok(&["commit-tree", &tree, "-m", message])?;
        self.run_ok(&["update-ref", &format!("refs/heads/{}", name), &commit])?;
        tracing::debug!(branch = name, commit = %commit, "created orphan branch");
        Ok(())
    }

    /// Delete a local branch, merged or not
    pub fn delete_branch(&self, name: &str) -> Result<(), GitError> {
        if !self.branch_exists(name) {
            return Err(GitError::BranchNotFound {
                branch: name.to_string(),
            });
        }
        self.run_ok(&["branch", "-D", name]).map(|_| ())
    }

    /// Checkout an existing branch
    pub fn checkout(&self, name: &str) -> Result<(), GitError> {
        if !self.branch_exists(name) {
            return Err(GitError::BranchNotFound {
                branch: name.to_string(),
            });
        }
        self.run_ok(&["checkout", "-q", name]).map(|_| ())
    }

    /// Stage a file for commit
    pub fn stage_file(&self, path: &Path) -> Result<(), GitError> {
        let path_str = path.to_string_lossy();
        self.run_ok(&["add", "--", &path_str]).map(|_| ())
    }

    /// Remove a file from the index and the working tree
    pub fn remove_file(&self, path: &Path) -> Result<(), GitError> {
        let path_str = path.to_string_lossy();
        self.run_ok(&["rm", "-q", "--ignore-unmatch", "--", &path_str])
            .map(|_| ())
    }

    /// Check if the index differs from HEAD for `path`
    pub fn has_staged_changes(&self, path: &Path) -> Result<bool, GitError> {
        let path_str = path.to_string_lossy();
        let output = self.run(&["diff", "--cached", "--quiet", "--", &path_str])?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(GitError::CommandFailed {
                message: output.stderr,
            }),
        }
    }

    /// Commit the staged state of `paths` only
    pub fn commit_paths(&self, message: &str, paths: &[&Path]) -> Result<String, GitError> {
        let path_strings: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args = vec!["commit", "-q", "-m", message, "--"];
        for path in &path_strings {
            args.push(path);
        }

        self.run_ok(&args)?;
        self.run_ok(&["rev-parse", "HEAD"])
    }

    /// Discard every uncommitted change to tracked files
    pub fn reset_hard(&self) -> Result<(), GitError> {
        self.run_ok(&["reset", "--hard", "-q"]).map(|_| ())
    }

    /// Pull `branch` from `remote`. A failing pull is reported through the
    /// returned output, not as an error.
    pub fn pull(&self, remote: &str, branch: &str) -> Result<GitOutput, GitError> {
        self.run(&["pull", remote, branch])
    }

    /// Push `branch` to `remote`. A failing push is reported through the
    /// returned output, not as an error.
    pub fn push(&self, remote: &str, branch: &str) -> Result<GitOutput, GitError> {
        self.run(&["push", remote, branch])
    }

    /// Configured remote names
    pub fn remotes(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run_ok(&["remote"])?;
        Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// Distinct (name, email) author pairs on `branch`, most recent first
    pub fn authors(&self, branch: &str) -> Result<Vec<(String, String)>, GitError> {
        let stdout = self.run_ok(&["log", "--format=%an%x1f%ae", branch, "--"])?;
        let mut authors: Vec<(String, String)> = Vec::new();
        for line in stdout.lines() {
            if let Some((name, email)) = line.split_once('\u{1f}') {
                let author = (name.to_string(), email.to_string());
                if !authors.contains(&author) {
                    authors.push(author);
                }
            }
        }
        Ok(authors)
    }

    /// Format a command for display
    pub fn format_command(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }
}
