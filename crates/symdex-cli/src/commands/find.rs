//! Find command - symbols containing a word, or the word under a cursor.

use super::{print_results, syntax_for};
use crate::app::App;
use crate::sink::TerminalSink;
use crate::QueryArgs;
use anyhow::{bail, Context};
use std::path::PathBuf;
use symdex_core::{word_at, MemoryBuffer, ScopeId, Settings, TextBuffer};
use tracing::debug;

/// A cursor given as `FILE:BYTE_OFFSET`.
#[derive(Debug, PartialEq, Eq)]
pub struct Cursor {
    pub file: PathBuf,
    pub offset: usize,
}

impl std::str::FromStr for Cursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, offset) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("expected FILE:OFFSET, got {}", s))?;
        if file.is_empty() {
            return Err(format!("missing file in cursor {}", s));
        }
        let offset = offset
            .parse()
            .map_err(|_| format!("invalid byte offset {}", offset))?;
        Ok(Cursor {
            file: PathBuf::from(file),
            offset,
        })
    }
}

/// Run the find command.
pub fn run(
    app: &App,
    word: Option<String>,
    cursor: Option<String>,
    folders: Vec<PathBuf>,
    query: QueryArgs,
) -> anyhow::Result<()> {
    let scope = query.workspace.scope();
    let sink = TerminalSink::new(query.output.clone(), query.pick, app.quiet);

    app.open_workspace(scope, folders, &sink)?;
    let settings = app.settings()?;

    let word = match (word, cursor) {
        (Some(word), _) => word,
        (None, Some(cursor)) => {
            let cursor: Cursor = cursor.parse().map_err(anyhow::Error::msg)?;
            cursor_word(app, &settings, scope, &cursor)?
        }
        (None, None) => bail!("give a word or --cursor"),
    };

    let symbols = app.service.find_at_cursor(&settings, scope, &word, &sink);
    print_results(&symbols, scope, &sink, &query.output, app.quiet)
}

/// Open the cursor's file as a buffer and take the word under the cursor
/// from that same text.
fn cursor_word(
    app: &App,
    settings: &Settings,
    scope: ScopeId,
    cursor: &Cursor,
) -> anyhow::Result<String> {
    let file = cursor
        .file
        .canonicalize()
        .with_context(|| format!("cannot open {}", cursor.file.display()))?;

    // the file under the cursor counts as open, so its symbols are
    // current even when it lies outside the workspace folders
    let buffer = MemoryBuffer::open(&file, syntax_for(settings, &file))?;
    let outcome = app.service.load_view(settings, scope, &buffer);
    debug!(?outcome, file = %file.display(), "Loaded cursor file");

    let text = buffer.text();
    match word_at(&text, cursor.offset) {
        Some(word) => Ok(word.to_string()),
        None => bail!("no word at byte {} of {}", cursor.offset, file.display()),
    }
}
