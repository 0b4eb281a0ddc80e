//! Branch transactions over the shared working tree
//!
//! Every store operation that touches a branch other than the checked-out
//! one runs inside these helpers. They stash uncommitted work, switch to
//! the target branch, run the operation and then put the working tree back
//! the way it was, on success and on failure alike.

use crate::core::error::{KoodError, Result};
use crate::core::git::Git;

/// Run `f` with tracked modifications stashed away.
///
/// Nothing is stashed (or popped) when the working tree is clean.
pub fn with_stash<T>(git: &Git, f: impl FnOnce() -> Result<T>) -> Result<T> {
    if git.change_count()? == 0 {
        return f();
    }

    git.stash()?;
    tracing::debug!(root = %git.root().display(), "stashed uncommitted changes");
    let result = f();
    settle(result, git.stash_pop().map_err(KoodError::from), "stash pop")
}

/// Run `f` with `target` checked out, then return to the original branch.
pub fn with_branch<T>(git: &Git, target: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let original = git.current_branch()?.ok_or(KoodError::DetachedHead)?;
    if original == target {
        return f();
    }

    if let Err(e) = checkout(git, target) {
        return settle(Err(e), restore(git, &original), "branch restore");
    }
    tracing::debug!(from = %original, to = %target, "switched branch");
    let result = f();
    settle(result, restore(git, &original), "branch restore")
}

/// [`with_branch`] nested inside [`with_stash`]
pub fn with_stash_and_branch<T>(
    git: &Git,
    target: &str,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    with_stash(git, || with_branch(git, target, f))
}

/// Check out `branch` and confirm HEAD actually moved there
pub(crate) fn checkout(git: &Git, branch: &str) -> Result<()> {
    git.checkout(branch).map_err(|e| KoodError::Checkout {
        branch: branch.to_string(),
        message: e.to_string(),
    })?;

    if !git.is_on_branch(branch)? {
        return Err(KoodError::Checkout {
            branch: branch.to_string(),
            message: "HEAD did not move to the branch".to_string(),
        });
    }
    Ok(())
}

fn restore(git: &Git, original: &str) -> Result<()> {
    if git.is_on_branch(original)? {
        return Ok(());
    }
    checkout(git, original)?;
    tracing::debug!(to = %original, "restored branch");
    Ok(())
}

/// Combine the outcome of an operation with the outcome of its cleanup.
///
/// A cleanup failure never replaces the operation's own error.
pub(crate) fn settle<T>(result: Result<T>, cleanup: Result<()>, step: &str) -> Result<T> {
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            tracing::warn!(step, error = %cleanup_err, "cleanup failed after an earlier error");
            Err(e)
        }
    }
}
