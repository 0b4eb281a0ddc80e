//! `kood list` command - create, delete and display the current board's lists

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{open_context, report, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::Board;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// List to create or delete; omit to display all lists
    pub id: Option<String>,

    /// Delete the list together with its cards
    #[arg(long, short = 'd', requires = "id")]
    pub delete: bool,
}

#[derive(Debug, Serialize)]
struct ListSummary {
    id: String,
    cards: usize,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context()?;
    let mut board = Board::current_required(&ctx).map_err(report)?;

    match args.id {
        Some(id) if args.delete => {
            board
                .with_context(|board| board.destroy_list(&id))
                .map_err(report)?;
            success("List deleted.");
        }
        Some(id) => {
            board
                .with_context(|board| board.create_list(&id))
                .map_err(report)?;
            success("List created.");
        }
        None => {
            let summaries = board
                .with_context(|board| {
                    board
                        .lists()?
                        .into_iter()
                        .map(|list| {
                            Ok(ListSummary {
                                cards: board.cards_in(&list)?.len(),
                                id: list.into_inner().id,
                            })
                        })
                        .collect::<crate::core::Result<Vec<_>>>()
                })
                .map_err(report)?;
            print_lists(&summaries, global)?;
        }
    }
    Ok(())
}

fn print_lists(summaries: &[ListSummary], global: &GlobalOpts) -> Result<()> {
    if summaries.is_empty() {
        return Err(miette::miette!("No lists were found."));
    }

    match global.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(summaries).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(summaries).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id | OutputFormat::Auto => {
            for summary in summaries {
                println!("{}", summary.id);
            }
        }
    }
    Ok(())
}
