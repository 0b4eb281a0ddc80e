//! `kood board` command - create, delete and display boards

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{open_context, report, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Context, Tracked};
use crate::entities::Board;

#[derive(clap::Args, Debug)]
pub struct BoardArgs {
    /// Board to create or delete; omit to display all boards
    pub id: Option<String>,

    /// Delete the board (the current board when no ID is given)
    #[arg(long, short = 'd')]
    pub delete: bool,

    /// Create the board in an external repository
    #[arg(long, short = 'r', value_name = "PATH", conflicts_with = "delete")]
    pub repo: Option<PathBuf>,
}

/// Machine-readable board listing entry
#[derive(Debug, Serialize)]
struct BoardSummary {
    id: String,
    current: bool,
    shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_repo: Option<PathBuf>,
    list_ids: Vec<String>,
}

pub fn run(args: BoardArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = open_context()?;

    if args.delete {
        return delete_board(&mut ctx, args.id.as_deref());
    }
    match args.id {
        Some(id) => create_board(&mut ctx, &id, args.repo),
        None if args.repo.is_some() => Err(miette::miette!(
            "Specify the ID of the board to create in the repository."
        )),
        None => list_boards(&ctx, global),
    }
}

fn create_board(ctx: &mut Context, id: &str, repo: Option<PathBuf>) -> Result<()> {
    let board = Board::create(ctx, id, repo.as_deref()).map_err(report)?;
    if board.is_current(ctx) {
        success("Board created and selected.");
    } else {
        success("Board created.");
    }
    Ok(())
}

fn delete_board(ctx: &mut Context, id: Option<&str>) -> Result<()> {
    let board = match id {
        Some(id) => Board::fetch(ctx, id),
        None => Board::current_required(ctx),
    }
    .map_err(report)?;

    board.delete(ctx).map_err(report)?;
    success("Board deleted.");
    Ok(())
}

fn list_boards(ctx: &Context, global: &GlobalOpts) -> Result<()> {
    let boards = Board::all(ctx).map_err(report)?;
    if boards.is_empty() {
        return Err(miette::miette!("No boards were found."));
    }

    let remote = &ctx.settings().remote;
    let summaries: Vec<BoardSummary> = boards
        .iter()
        .map(|board| summarize(ctx, board, remote))
        .collect();

    match global.format {
        OutputFormat::Id => {
            for summary in &summaries {
                println!("{}", summary.id);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summaries).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&summaries).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Auto => {
            let width = summaries.iter().map(|s| s.id.len()).max().unwrap_or(0);
            for summary in &summaries {
                let marker = if summary.current { "*" } else { " " };
                println!(
                    "{} {:<width$}  {}",
                    marker,
                    summary.id,
                    style(visibility(summary)).dim(),
                    width = width
                );
            }
        }
    }
    Ok(())
}

fn summarize(ctx: &Context, board: &Tracked<Board>, remote: &str) -> BoardSummary {
    BoardSummary {
        id: board.id.clone(),
        current: board.is_current(ctx),
        shared: board.is_published(remote),
        custom_repo: board.custom_repo.clone(),
        list_ids: board.list_ids.clone(),
    }
}

fn visibility(summary: &BoardSummary) -> String {
    match (&summary.custom_repo, summary.shared) {
        (_, true) => "(shared)".to_string(),
        (Some(path), false) => format!("(private at {})", path.display()),
        (None, false) => "(private)".to_string(),
    }
}
