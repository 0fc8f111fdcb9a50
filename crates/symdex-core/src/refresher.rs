//! Synchronous single-buffer refresh.
//!
//! Runs on the interactive path whenever a file is opened or saved. It scans
//! the live buffer text (never the file on disk) and swaps that file's symbols
//! in the store in one step.

use crate::config::WorkspaceConfig;
use crate::scanner::buffer_symbols;
use crate::store::SymbolStore;
use crate::types::{ScopeId, Symbol};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

/// An open editor buffer, as seen by the indexer.
pub trait TextBuffer {
    /// Path of the file backing the buffer; `None` for unsaved scratch buffers
    fn path(&self) -> Option<&Path>;

    /// Syntax identifier, e.g. `Packages/Python/Python.tmLanguage`
    fn syntax(&self) -> &str;

    /// Current buffer contents
    fn text(&self) -> Cow<'_, str>;
}

/// A buffer held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBuffer {
    path: Option<PathBuf>,
    syntax: String,
    text: String,
}

impl MemoryBuffer {
    pub fn new(path: Option<PathBuf>, syntax: impl Into<String>, text: impl Into<String>) -> Self {
        MemoryBuffer {
            path,
            syntax: syntax.into(),
            text: text.into(),
        }
    }

    /// Load a file from disk into a buffer.
    pub fn open(path: &Path, syntax: impl Into<String>) -> crate::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(MemoryBuffer::new(Some(path.to_path_buf()), syntax, text))
    }

    /// Replace the buffer contents, as an edit would.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl TextBuffer for MemoryBuffer {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn syntax(&self) -> &str {
        &self.syntax
    }

    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The buffer's syntax maps to no configured language
    NoLanguage,
    /// The buffer has no file path, so there is nothing to key symbols on
    Unsaved,
    /// The file's symbols were replaced
    Refreshed { symbols: usize },
}

/// Rescans single buffers into the shared store.
#[derive(Debug, Clone)]
pub struct LiveRefresher {
    store: Arc<SymbolStore>,
}

impl LiveRefresher {
    pub fn new(store: Arc<SymbolStore>) -> Self {
        LiveRefresher { store }
    }

    /// Rescan `buffer` and replace its file's symbols, tagged with `scope`.
    #[instrument(skip(self, buffer, config), fields(syntax = %buffer.syntax()))]
    pub fn refresh(
        &self,
        buffer: &dyn TextBuffer,
        config: &WorkspaceConfig,
        scope: ScopeId,
    ) -> RefreshOutcome {
        let Some(rule) = config.language_for_syntax(buffer.syntax()) else {
            debug!("No language for buffer syntax");
            return RefreshOutcome::NoLanguage;
        };
        let Some(path) = buffer.path() else {
            return RefreshOutcome::Unsaved;
        };

        let text = buffer.text();
        let symbols: Vec<Symbol> = buffer_symbols(path, &text, rule, scope)
            .into_iter()
            .map(|m| m.symbol)
            .collect();

        let count = self.store.replace_file(path, symbols);
        debug!(path = %path.display(), symbols = count, "Refreshed buffer");
        RefreshOutcome::Refreshed { symbols: count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternRule;

    const SYNTAX: &str = "Packages/Python/Python.tmLanguage";

    fn setup() -> (Arc<SymbolStore>, LiveRefresher, WorkspaceConfig) {
        let store = Arc::new(SymbolStore::new());
        let refresher = LiveRefresher::new(store.clone());
        let config = WorkspaceConfig::default()
            .with_rule(
                PatternRule::new("Python", &["py"], &[r"^\s*def \w+", r"^class \w+"]).unwrap(),
            );
        (store, refresher, config)
    }

    fn buffer(text: &str) -> MemoryBuffer {
        MemoryBuffer::new(Some(PathBuf::from("/w/live.py")), SYNTAX, text)
    }

    #[test]
    fn test_refresh_scans_buffer_text() {
        let (store, refresher, config) = setup();
        let buf = buffer("class A:\n    def run(self):\n        pass\n");

        let outcome = refresher.refresh(&buf, &config, ScopeId::new(3));
        assert_eq!(outcome, RefreshOutcome::Refreshed { symbols: 2 });

        let symbols = store.list_all(ScopeId::new(3));
        assert_eq!(symbols[0].raw_text, "    def run");
        assert_eq!(symbols[0].line, 2);
        assert_eq!(symbols[1].raw_text, "class A");
        assert_eq!(symbols[1].line, 1);
    }

    #[test]
    fn test_open_then_save_is_stable() {
        let (store, refresher, config) = setup();
        let buf = buffer("def foo():\n  x=1\ndef bar():\n");

        refresher.refresh(&buf, &config, ScopeId::new(1));
        let after_open = store.all_symbols();
        refresher.refresh(&buf, &config, ScopeId::new(1));
        let after_save = store.all_symbols();

        assert_eq!(after_open.len(), 2);
        assert_eq!(after_open, after_save);
    }

    #[test]
    fn test_multiline_match_keeps_start_line() {
        let store = Arc::new(SymbolStore::new());
        let refresher = LiveRefresher::new(store.clone());
        let config = WorkspaceConfig::default()
            .with_rule(PatternRule::new("Notes", &["txt"], &[r"\n+label: \w+"]).unwrap());
        let buf = MemoryBuffer::new(
            Some(PathBuf::from("/w/notes.txt")),
            "Notes",
            "intro\n\nlabel: one\n",
        );

        refresher.refresh(&buf, &config, ScopeId::new(1));
        let symbols = store.all_symbols();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].line, 1);
        assert_eq!(symbols[0].raw_text, "label: one");
    }

    #[test]
    fn test_refresh_sees_unsaved_edits() {
        let (store, refresher, config) = setup();
        let mut buf = buffer("def old():\n");
        refresher.refresh(&buf, &config, ScopeId::new(1));

        buf.set_text("def new():\ndef newer():\n");
        refresher.refresh(&buf, &config, ScopeId::new(1));

        let texts: Vec<_> = store.all_symbols().into_iter().map(|s| s.raw_text).collect();
        assert_eq!(texts, vec!["def new", "def newer"]);
    }

    #[test]
    fn test_unknown_syntax_is_ignored() {
        let (store, refresher, config) = setup();
        store.append(Symbol::new("/w/live.py", 1, "def kept", ScopeId::new(1)));

        let buf = MemoryBuffer::new(
            Some(PathBuf::from("/w/live.py")),
            "Packages/Text/Plain text.tmLanguage",
            "def foo():\n",
        );
        assert_eq!(
            refresher.refresh(&buf, &config, ScopeId::new(1)),
            RefreshOutcome::NoLanguage
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_scratch_buffer_is_not_stored() {
        let (store, refresher, config) = setup();
        let buf = MemoryBuffer::new(None, SYNTAX, "def foo():\n");

        assert_eq!(
            refresher.refresh(&buf, &config, ScopeId::new(1)),
            RefreshOutcome::Unsaved
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_open_from_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("m.py");
        std::fs::write(&path, "def on_disk():\n").unwrap();

        let buf = MemoryBuffer::open(&path, SYNTAX).unwrap();
        assert_eq!(buf.path(), Some(path.as_path()));
        assert_eq!(buf.text(), "def on_disk():\n");
    }
}
