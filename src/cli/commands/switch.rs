//! `kood switch` command - select the current board

use console::style;
use miette::Result;

use crate::cli::helpers::{open_context, report, success};
use crate::entities::Board;

#[derive(clap::Args, Debug)]
pub struct SwitchArgs {
    /// Board to select
    pub id: String,
}

pub fn run(args: SwitchArgs) -> Result<()> {
    let mut ctx = open_context()?;
    let board = Board::fetch(&ctx, &args.id).map_err(report)?;
    board.select(&mut ctx).map_err(report)?;
    success(&format!("Board switched to {}.", style(&board.id).cyan()));
    Ok(())
}
