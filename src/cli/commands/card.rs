//! `kood card` command - create, change, copy, delete and display cards

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::commands::edit::{self, EditOutcome};
use crate::cli::helpers::{open_context, parse_assignment, report, success, try_convert};
use crate::cli::table::{render_board, render_card};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::to_record;
use crate::core::{Context, Entity, KoodError, Tracked};
use crate::entities::{Board, Card, List};
use crate::yaml;

#[derive(clap::Args, Debug)]
pub struct CardArgs {
    /// Card ID or title (partial matches accepted); the title of a new card
    /// when --list is given. Omit to display the whole board.
    pub card: Option<String>,

    /// Create the card in this list
    #[arg(long, short = 'l', value_name = "LIST")]
    pub list: Option<String>,

    /// Delete the card
    #[arg(long, short = 'd', conflicts_with_all = ["edit", "set", "unset", "add", "remove"])]
    pub delete: bool,

    /// Copy the card, into LIST when given
    #[arg(
        long,
        short = 'c',
        value_name = "LIST",
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub copy: Option<String>,

    /// Open the card in the configured editor
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Set attributes
    #[arg(long, short = 's', value_name = "KEY:VALUE", num_args = 1.., allow_hyphen_values = true)]
    pub set: Vec<String>,

    /// Clear attributes
    #[arg(long, short = 'u', value_name = "KEY", num_args = 1..)]
    pub unset: Vec<String>,

    /// Append values to a list attribute
    #[arg(long, short = 'a', value_names = ["KEY", "VALUE"], num_args = 2.., allow_hyphen_values = true)]
    pub add: Vec<String>,

    /// Remove values from a list attribute
    #[arg(long, short = 'r', value_names = ["KEY", "VALUE"], num_args = 2.., allow_hyphen_values = true)]
    pub remove: Vec<String>,
}

impl CardArgs {
    fn has_operations(&self) -> bool {
        self.list.is_some()
            || self.delete
            || self.copy.is_some()
            || self.edit
            || self.has_changes()
    }

    fn has_changes(&self) -> bool {
        !(self.set.is_empty()
            && self.unset.is_empty()
            && self.add.is_empty()
            && self.remove.is_empty())
    }

    fn touches_participants(&self) -> bool {
        [&self.add, &self.remove]
            .iter()
            .any(|values| values.first().map(String::as_str) == Some("participants"))
    }
}

enum Outcome {
    Done,
    Unchanged,
    Edited(EditOutcome),
}

/// A list and its cards, for machine-readable board output
#[derive(Debug, Serialize)]
struct Column {
    id: String,
    cards: Vec<Card>,
}

pub fn run(args: CardArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = open_context()?;
    let mut board = Board::current_required(&ctx).map_err(report)?;

    if !args.has_operations() {
        return match &args.card {
            Some(term) => show_card(&ctx, &board, term, global),
            None => show_board(&mut board, global),
        };
    }
    let Some(term) = args.card.as_deref() else {
        return Err(miette::miette!("Specify the ID or title of a card."));
    };

    let outcome = board
        .with_context(|board| operate(&ctx, board, term, &args))
        .map_err(report)?;
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Unchanged => Err(miette::miette!("No changes to persist.")),
        Outcome::Edited(outcome) => edit::finish(outcome),
    }
}

fn operate(
    ctx: &Context,
    board: &mut Tracked<Board>,
    term: &str,
    args: &CardArgs,
) -> crate::core::Result<Outcome> {
    let mut card = match &args.list {
        Some(list_id) => {
            let card = board.create_card(list_id, term)?;
            success("Card created.");
            card
        }
        None => board.find_card(term, args.delete)?,
    };

    if let Some(target) = &args.copy {
        let target = Some(target.as_str()).filter(|t| !t.is_empty());
        board.copy_card(&card, target)?;
        success("Card copied.");
    }

    if args.delete {
        board.destroy_card(&card.id)?;
        success("Card deleted.");
        return Ok(Outcome::Done);
    }

    if args.edit {
        return edit::edit(ctx, board, &mut card).map(Outcome::Edited);
    }

    if !args.has_changes() {
        return Ok(Outcome::Done);
    }
    apply_changes(board, &mut card, args)?;

    if board.save_card(&mut card)? {
        success("Card updated.");
        Ok(Outcome::Done)
    } else {
        Ok(Outcome::Unchanged)
    }
}

fn apply_changes(
    board: &Tracked<Board>,
    card: &mut Card,
    args: &CardArgs,
) -> crate::core::Result<()> {
    let members = if args.touches_participants() {
        board.potential_members()?
    } else {
        Vec::new()
    };

    for raw in &args.set {
        let (key, value) = parse_assignment(raw).ok_or_else(|| {
            KoodError::validation(
                Card::KIND,
                "attribute",
                format!("'{}' is not a key:value pair", raw),
            )
        })?;
        card.set(key, try_convert(value))?;
    }
    for key in &args.unset {
        card.unset(key);
    }
    if let Some((key, values)) = args.add.split_first() {
        card.add(key, values, &members)?;
    }
    if let Some((key, values)) = args.remove.split_first() {
        card.remove(key, values, &members)?;
    }
    Ok(())
}

fn show_card(ctx: &Context, board: &Tracked<Board>, term: &str, global: &GlobalOpts) -> Result<()> {
    let card = board.find_card(term, false).map_err(report)?;

    match global.format {
        OutputFormat::Id => println!("{}", card.id),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&*card).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let record = to_record(&*card).map_err(report)?;
            let text = yaml::encode(&record).map_err(|e| report(e.into()))?;
            print!("{}", text);
        }
        OutputFormat::Auto => println!("{}", render_card(&card, ctx.config())),
    }
    Ok(())
}

fn show_board(board: &mut Tracked<Board>, global: &GlobalOpts) -> Result<()> {
    let columns: Vec<(List, Vec<Card>)> = board
        .with_context(|board| {
            board
                .lists()?
                .into_iter()
                .map(|list| {
                    let cards = board.cards_in(&list)?;
                    Ok((
                        list.into_inner(),
                        cards.into_iter().map(Tracked::into_inner).collect(),
                    ))
                })
                .collect::<crate::core::Result<Vec<_>>>()
        })
        .map_err(report)?;

    if columns.is_empty() {
        return Err(miette::miette!("No lists were found."));
    }

    match global.format {
        OutputFormat::Id => {
            for (_, cards) in &columns {
                for card in cards {
                    println!("{}", card.id);
                }
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let view: Vec<Column> = columns
                .into_iter()
                .map(|(list, cards)| Column { id: list.id, cards })
                .collect();
            if global.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&view).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&view).into_diagnostic()?);
            }
        }
        OutputFormat::Auto => {
            println!("{}", console::style(&board.id).bold());
            println!("{}", render_board(&columns));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::core::testing::scratch_context;
    use clap::Parser;

    fn card_args(argv: &[&str]) -> CardArgs {
        let mut full = vec!["kood", "card"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Card(args) => args,
            _ => panic!("expected card command"),
        }
    }

    fn board() -> (tempfile::TempDir, Context, Tracked<Board>) {
        let (tmp, mut ctx) = scratch_context();
        let mut board = Board::create(&mut ctx, "foo", None).unwrap();
        board.create_list("todo").unwrap();
        board.create_list("done").unwrap();
        (tmp, ctx, board)
    }

    #[test]
    fn test_has_operations() {
        assert!(!card_args(&[]).has_operations());
        assert!(!card_args(&["Sample"]).has_operations());
        assert!(card_args(&["Sample", "-l", "todo"]).has_operations());
        assert!(card_args(&["Sample", "-u", "labels"]).has_changes());
        assert!(card_args(&["Sample", "-a", "participants", "jane"]).touches_participants());
        assert!(!card_args(&["Sample", "-a", "labels", "bug"]).touches_participants());
    }

    #[test]
    fn test_create_then_set_in_one_call() {
        let (_tmp, ctx, mut board) = board();
        let args = card_args(&["Sample card", "-l", "todo", "-s", "priority:1"]);

        let outcome = board
            .with_context(|b| operate(&ctx, b, "Sample card", &args))
            .unwrap();
        assert!(matches!(outcome, Outcome::Done));

        let card = board.find_card("Sample", false).unwrap();
        assert_eq!(card.list_id, "todo");
        assert_eq!(card.more.get("priority"), Some(&crate::entities::AttrValue::Integer(1)));
    }

    #[test]
    fn test_unchanged_card() {
        let (_tmp, ctx, mut board) = board();
        board.create_card("todo", "Sample card").unwrap();
        let args = card_args(&["Sample", "-u", "nothing"]);

        let outcome = board
            .with_context(|b| operate(&ctx, b, "Sample", &args))
            .unwrap();
        assert!(matches!(outcome, Outcome::Unchanged));
    }

    #[test]
    fn test_copy_into_other_list() {
        let (_tmp, ctx, mut board) = board();
        board.create_card("todo", "Sample card").unwrap();
        let args = card_args(&["Sample", "-c", "done"]);

        board
            .with_context(|b| operate(&ctx, b, "Sample", &args))
            .unwrap();

        let lists: Vec<String> = board
            .find_cards("Sample")
            .unwrap()
            .iter()
            .map(|c| c.list_id.clone())
            .collect();
        assert_eq!(lists.len(), 2);
        assert!(lists.contains(&"done".to_string()));
    }

    #[test]
    fn test_bad_assignment() {
        let (_tmp, ctx, mut board) = board();
        board.create_card("todo", "Sample card").unwrap();
        let args = card_args(&["Sample", "-s", "priority"]);

        let err = board
            .with_context(|b| operate(&ctx, b, "Sample", &args))
            .err()
            .unwrap();
        assert!(matches!(err, KoodError::Validation { field: "attribute", .. }));
    }
}
