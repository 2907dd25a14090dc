mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    changes::ChangesArgs, hook::HookSubcommand, pattern::PatternSubcommand,
    session::SessionSubcommand, stack::StackArgs,
};
use memory_core::{ErrorKind, MemoryError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "memory",
    about = "Session memory for coding-assistant skills: current task, recent changes, patterns, tech stack",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .claude-memory/ or .git/)
    #[arg(long, global = true, env = "MEMORY_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the .claude-memory layout and archive an expired session
    Init,

    /// Show, update, and archive the working session
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },

    /// Record a change to a file in the current session
    Track {
        /// File path, relative to the project root or absolute
        file: String,
        /// created, created/updated, modified, deleted, staged, committed (or create, update, ...)
        #[arg(long, short = 'a', default_value = "modified")]
        action: String,
        /// Free-text description (default: "Tracked: <action>")
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// List recent changes in the current session
    Changes(ChangesArgs),

    /// Learn and browse code patterns
    Pattern {
        #[command(subcommand)]
        subcommand: PatternSubcommand,
    },

    /// Show or update the project tech stack
    Stack(StackArgs),

    /// Entry points for assistant tool-use hooks (payload on stdin)
    Hook {
        #[command(subcommand)]
        subcommand: HookSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Session { subcommand } => cmd::session::run(&root, subcommand, cli.json),
        Commands::Track {
            file,
            action,
            description,
        } => cmd::changes::track(&root, &file, &action, description.as_deref(), cli.json),
        Commands::Changes(args) => cmd::changes::run(&root, args, cli.json),
        Commands::Pattern { subcommand } => cmd::pattern::run(&root, subcommand, cli.json),
        Commands::Stack(args) => cmd::stack::run(&root, args, cli.json),
        Commands::Hook { subcommand } => cmd::hook::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        if let Some(tip) = e
            .chain()
            .find_map(|c| c.downcast_ref::<MemoryError>())
            .and_then(tip_for)
        {
            eprintln!("tip: {tip}");
        }
        std::process::exit(1);
    }
}

fn tip_for(err: &MemoryError) -> Option<&'static str> {
    if !err.is_recoverable() {
        return None;
    }
    Some(match err {
        MemoryError::SessionNotFound => "start one with `memory session new`",
        MemoryError::SessionExists(_) => {
            "archive it with `memory session archive`, or pass `--policy replace`"
        }
        MemoryError::ArchiveNotFound(_) => "list archived sessions with `memory session archives`",
        MemoryError::PatternNotFound { .. } => "list learned patterns with `memory pattern show`",
        _ if err.kind() == ErrorKind::Validation => "see `memory help` for accepted values",
        _ => return None,
    })
}
