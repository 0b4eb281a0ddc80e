use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use kood::cli::commands::sync::Direction;
use kood::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` exits quietly.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KOOD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let global = cli.global;
    if global.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match cli.command {
        Commands::Board(args) => kood::cli::commands::board::run(args, &global),
        Commands::Switch(args) => kood::cli::commands::switch::run(args),
        Commands::List(args) => kood::cli::commands::list::run(args, &global),
        Commands::Card(args) => kood::cli::commands::card::run(args, &global),
        Commands::Edit(args) => kood::cli::commands::edit::run(args),
        Commands::Pull(args) => kood::cli::commands::sync::run(Direction::Pull, args),
        Commands::Push(args) => kood::cli::commands::sync::run(Direction::Push, args),
        Commands::Sync(args) => kood::cli::commands::sync::run(Direction::Sync, args),
        Commands::Completions(args) => kood::cli::commands::completions::run(args),
    }
}
