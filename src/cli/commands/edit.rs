//! `kood edit` command - open a card in the user's editor

use miette::Result;
use std::path::Path;

use crate::cli::helpers::{open_context, report, success};
use crate::core::{Context, Tracked};
use crate::entities::{Board, Card};

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Card ID or title (partial matches accepted)
    pub card: String,
}

/// How an editor session ended
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum EditOutcome {
    Updated,
    Unchanged,
    NoEditor,
    /// The editor could not be started or exited with an error
    Failed(String),
}

pub fn run(args: EditArgs) -> Result<()> {
    let ctx = open_context()?;
    let mut board = Board::current_required(&ctx).map_err(report)?;

    let outcome = board
        .with_context(|board| {
            let mut card = board.find_card(&args.card, false)?;
            edit(&ctx, board, &mut card)
        })
        .map_err(report)?;
    finish(outcome)
}

/// Let the user edit `card` and save what they wrote
pub(crate) fn edit(
    ctx: &Context,
    board: &Tracked<Board>,
    card: &mut Tracked<Card>,
) -> crate::core::Result<EditOutcome> {
    let Some(editor) = ctx.settings().editor() else {
        return Ok(EditOutcome::NoEditor);
    };

    let mut failed: Option<String> = None;
    let changed = board.edit_card(card, |path: &Path| {
        let command = format!("{} {}", editor, path.display());
        match ctx.settings().run_editor(path) {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::debug!(%command, ?status, "editor exited with an error");
                failed = Some(command);
                false
            }
            Err(e) => {
                tracing::debug!(%command, error = %e, "could not start editor");
                failed = Some(command);
                false
            }
        }
    })?;

    Ok(match (failed, changed) {
        (Some(command), _) => EditOutcome::Failed(command),
        (None, true) => EditOutcome::Updated,
        (None, false) => EditOutcome::Unchanged,
    })
}

/// Report an editor session to the user
pub(crate) fn finish(outcome: EditOutcome) -> Result<()> {
    match outcome {
        EditOutcome::Updated => {
            success("Card updated.");
            Ok(())
        }
        EditOutcome::Unchanged => Err(miette::miette!("The editor exited without changes.")),
        EditOutcome::NoEditor => Err(miette::miette!(
            "To edit a card set $EDITOR or $KOOD_EDITOR."
        )),
        EditOutcome::Failed(command) => Err(miette::miette!("Could not run `{}`.", command)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::scratch_context;

    fn context_with_editor(editor: Option<&str>) -> (tempfile::TempDir, Context) {
        let (tmp, ctx) = scratch_context();
        let mut settings = ctx.settings().clone();
        settings.editor = editor.map(str::to_string);
        let ctx = Context::open(settings).unwrap();
        (tmp, ctx)
    }

    fn sample_card(ctx: &mut Context) -> (Tracked<Board>, Tracked<Card>) {
        let mut board = Board::create(ctx, "foo", None).unwrap();
        board.create_list("todo").unwrap();
        let card = board.create_card("todo", "Sample card").unwrap();
        (board, card)
    }

    #[test]
    fn test_edit_without_editor() {
        let (_tmp, mut ctx) = context_with_editor(None);
        let (board, mut card) = sample_card(&mut ctx);
        assert_eq!(edit(&ctx, &board, &mut card).unwrap(), EditOutcome::NoEditor);
    }

    #[test]
    fn test_edit_with_missing_editor() {
        let (_tmp, mut ctx) = context_with_editor(Some("kood-no-such-editor"));
        let (board, mut card) = sample_card(&mut ctx);

        let outcome = edit(&ctx, &board, &mut card).unwrap();
        assert!(
            matches!(&outcome, EditOutcome::Failed(cmd) if cmd.starts_with("kood-no-such-editor ")),
            "{:?}",
            outcome
        );
        assert_eq!(board.card_store().fetch(&card.id).unwrap().title, "Sample card");
    }

    #[cfg(unix)]
    #[test]
    fn test_edit_with_noop_editor() {
        let (_tmp, mut ctx) = context_with_editor(Some("true"));
        let (board, mut card) = sample_card(&mut ctx);
        assert_eq!(edit(&ctx, &board, &mut card).unwrap(), EditOutcome::Unchanged);
    }

    #[test]
    fn test_finish_messages() {
        assert!(finish(EditOutcome::Updated).is_ok());
        assert_eq!(
            finish(EditOutcome::NoEditor).unwrap_err().to_string(),
            "To edit a card set $EDITOR or $KOOD_EDITOR."
        );
        assert_eq!(
            finish(EditOutcome::Failed("vi x.md".to_string()))
                .unwrap_err()
                .to_string(),
            "Could not run `vi x.md`."
        );
        assert_eq!(
            finish(EditOutcome::Unchanged).unwrap_err().to_string(),
            "The editor exited without changes."
        );
    }
}
