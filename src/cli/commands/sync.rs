//! `kood pull`, `kood push` and `kood sync` - exchange a board with a remote

use miette::Result;

use crate::cli::helpers::{open_context, report, success};
use crate::core::GitOutput;
use crate::entities::Board;

#[derive(clap::Args, Debug)]
pub struct RemoteArgs {
    /// Board to transfer (default: the current board)
    pub board: Option<String>,

    /// Remote to use (default: $KOOD_REMOTE or origin)
    #[arg(long, short = 'r')]
    pub remote: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Pull,
    Push,
    Sync,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Direction::Pull => "pull",
            Direction::Push => "push",
            Direction::Sync => "synchronize",
        }
    }
}

pub fn run(direction: Direction, args: RemoteArgs) -> Result<()> {
    let ctx = open_context()?;
    let board = match &args.board {
        Some(id) => Board::fetch(&ctx, id),
        None => Board::current_required(&ctx),
    }
    .map_err(report)?;
    let remote = args
        .remote
        .unwrap_or_else(|| ctx.settings().remote.clone());

    let output = match direction {
        Direction::Pull => board.pull(&remote),
        Direction::Push => board.push(&remote),
        Direction::Sync => board.sync(&remote),
    }
    .map_err(report)?;

    match describe(direction, &output) {
        Ok(message) => {
            success(&message);
            Ok(())
        }
        Err(detail) if detail.contains("does not appear to be a git repository") => {
            let remotes = board.git().remotes().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not list remotes");
                Vec::new()
            });
            Err(miette::miette!(
                help = remote_hint(&remote, &remotes),
                "Could not {} board {}: {}",
                direction.verb(),
                board.id,
                detail
            ))
        }
        Err(detail) => Err(miette::miette!(
            "Could not {} board {}: {}",
            direction.verb(),
            board.id,
            detail
        )),
    }
}

/// Advice for a remote git does not know about
fn remote_hint(remote: &str, remotes: &[String]) -> String {
    if remotes.is_empty() {
        format!("Remote '{}' is not set. No remotes are configured.", remote)
    } else {
        format!(
            "Remote '{}' is not set. Configured remotes: {}.",
            remote,
            remotes.join(", ")
        )
    }
}

/// Message for a finished transfer, or the git output explaining a failure
fn describe(direction: Direction, output: &GitOutput) -> std::result::Result<String, String> {
    if !output.success {
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim()
        } else {
            output.stderr.trim()
        };
        return Err(detail.to_string());
    }

    // git reports "Already up to date." on pull and "Everything up-to-date" on push
    let text = format!("{}\n{}", output.stdout, output.stderr).to_lowercase();
    let up_to_date = text.contains("already up to date")
        || text.contains("already up-to-date")
        || text.contains("everything up-to-date");

    Ok(match (direction, up_to_date) {
        (Direction::Pull, true) => "Board already up-to-date.".to_string(),
        (_, true) => "Board in central server already up-to-date.".to_string(),
        (Direction::Pull, false) => "Board pulled.".to_string(),
        (Direction::Push, false) => "Board pushed.".to_string(),
        (Direction::Sync, false) => "Board synchronized.".to_string(),
    })
}
