//! # Symdex CLI
//!
//! Command-line host for the Symdex symbol index. Each invocation plays the
//! part of an editor session: it opens a workspace on the given folders,
//! indexes them in the background while animating the status line, then
//! answers a query.
//!
//! ## Commands
//!
//! - `symdex list <folders...>` - List every symbol in the workspace
//! - `symdex find <word> [-f <folders...>]` - Symbols whose text contains a word
//! - `symdex scan <file> [-w <id>]` - Rescan a single file as an open buffer
//! - `symdex config` - Show the settings file and configured languages
//!
//! ## Example Usage
//!
//! ```bash
//! # Every Python and Rust symbol under the current directory
//! symdex list .
//!
//! # Symbols containing the word under byte 120 of main.py
//! symdex find --cursor src/main.py:120
//!
//! # Pick the second match and print its location
//! symdex find parse -f src tests --pick 2
//! ```

mod app;
mod commands;
mod sink;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use symdex_core::ScopeId;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Symdex - pattern-driven workspace symbol index
#[derive(Parser)]
#[command(name = "symdex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The workspace a command acts for
#[derive(Args, Clone, Copy, Debug)]
pub struct WorkspaceArg {
    /// Workspace id to scope symbols to (0 = global)
    #[arg(short, long, default_value = "1")]
    workspace: u64,
}

impl WorkspaceArg {
    pub fn scope(&self) -> ScopeId {
        ScopeId::new(self.workspace)
    }
}

/// Options shared by the query commands
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    workspace: WorkspaceArg,

    /// Choose this 1-based row when several symbols match
    #[arg(long)]
    pick: Option<usize>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// List every symbol visible to the workspace
    List {
        /// Workspace folders to index
        #[arg(required = true)]
        folders: Vec<PathBuf>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Find symbols whose text contains a word
    Find {
        /// Word to search for (case-sensitive)
        #[arg(required_unless_present = "cursor")]
        word: Option<String>,

        /// Take the word under a cursor instead, given as FILE:BYTE_OFFSET
        #[arg(long, conflicts_with = "word")]
        cursor: Option<String>,

        /// Workspace folders to index
        #[arg(short, long, num_args = 1.., default_value = ".")]
        folders: Vec<PathBuf>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Rescan one file the way an editor does on open and save
    Scan {
        /// File to scan
        file: PathBuf,

        /// Syntax identifier (defaults to the language matching the extension)
        #[arg(short, long)]
        syntax: Option<String>,

        #[command(flatten)]
        workspace: WorkspaceArg,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show the settings file location and configured languages
    Config,
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let app = app::App::new(cli.config.as_deref(), cli.quiet)?;

    match cli.command {
        Commands::List { folders, query } => commands::list::run(&app, folders, query),
        Commands::Find {
            word,
            cursor,
            folders,
            query,
        } => commands::find::run(&app, word, cursor, folders, query),
        Commands::Scan {
            file,
            syntax,
            workspace,
            output,
        } => commands::scan::run(&app, &file, syntax, workspace.scope(), output),
        Commands::Config => commands::config::run(&app),
    }
}
