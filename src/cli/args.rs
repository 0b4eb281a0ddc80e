//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    board::BoardArgs, card::CardArgs, completions::CompletionsArgs, edit::EditArgs,
    list::ListArgs, switch::SwitchArgs, sync::RemoteArgs,
};

#[derive(Parser)]
#[command(name = "kood")]
#[command(author, version, about = "Kanban boards kept in git")]
#[command(
    long_about = "Kanban boards kept in git.\n\n\
    Each board is a branch of the storage repository; lists and cards are \
    files on it. Create a board, add lists, then add cards to the lists."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, delete or display boards
    #[command(visible_alias = "boards")]
    Board(BoardArgs),

    /// Select the board other commands work on
    #[command(visible_alias = "select")]
    Switch(SwitchArgs),

    /// Create, delete or display lists of the current board
    #[command(visible_alias = "lists")]
    List(ListArgs),

    /// Create, change, copy, delete or display cards
    #[command(visible_alias = "cards")]
    Card(CardArgs),

    /// Open a card in $KOOD_EDITOR or $EDITOR
    Edit(EditArgs),

    /// Fetch a board's branch from the remote
    Pull(RemoteArgs),

    /// Publish a board's branch to the remote
    Push(RemoteArgs),

    /// Pull a board, then push it if the pull succeeded
    Sync(RemoteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output for the terminal
    #[default]
    Auto,
    /// YAML, as stored on the board branch
    Yaml,
    /// JSON for programmatic use
    Json,
    /// Only IDs, one per line
    Id,
}
