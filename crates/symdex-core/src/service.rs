//! Host-facing coordinator.
//!
//! `SymbolService` owns the process-scoped state: the shared [`SymbolStore`]
//! and the [`LoadedFolderSet`]. Create one when the host starts and keep it
//! for the life of the process. Hosts call it from their event callbacks:
//!
//! | host event                  | method                      |
//! |-----------------------------|-----------------------------|
//! | file opened                 | [`SymbolService::on_file_opened`] |
//! | file saved                  | [`SymbolService::on_file_saved`]  |
//! | "list all symbols"          | [`SymbolService::list_all`]       |
//! | "find symbol under cursor"  | [`SymbolService::find_at_cursor`] |
//!
//! Every call takes the host's current [`Settings`] and resolves a fresh
//! [`WorkspaceConfig`] from them, so settings edits apply to the next call.

use crate::config::{Settings, WorkspaceConfig};
use crate::display::{render, DisplaySink};
use crate::indexer::{BackgroundIndexer, IndexerHandle, LoadedFolderSet, ScanProgress};
use crate::refresher::{LiveRefresher, RefreshOutcome, TextBuffer};
use crate::status::EMPTY_SYMBOL;
use crate::store::SymbolStore;
use crate::types::{ScopeId, Symbol, Workspace};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Process-wide symbol indexing service.
pub struct SymbolService {
    store: Arc<SymbolStore>,
    loaded: Arc<LoadedFolderSet>,
    refresher: LiveRefresher,
    progress: Option<Arc<dyn ScanProgress>>,
}

impl Default for SymbolService {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolService {
    pub fn new() -> Self {
        let store = Arc::new(SymbolStore::new());
        SymbolService {
            refresher: LiveRefresher::new(store.clone()),
            store,
            loaded: Arc::new(LoadedFolderSet::new()),
            progress: None,
        }
    }

    /// Attach a progress reporter to every background run.
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &Arc<SymbolStore> {
        &self.store
    }

    pub fn loaded_folders(&self) -> &Arc<LoadedFolderSet> {
        &self.loaded
    }

    /// Start indexing the workspace's folders in the background.
    ///
    /// Returns `None` when there is nothing to start: no folders, folder
    /// loading disabled, or the thread could not be spawned.
    pub fn load_folders(
        &self,
        settings: &Settings,
        workspace: &Workspace,
    ) -> Option<IndexerHandle> {
        if workspace.folders.is_empty() {
            return None;
        }
        let config = WorkspaceConfig::resolve(settings);
        if !config.load_folders {
            debug!(scope = %workspace.id, "Folder loading disabled");
            return None;
        }

        let mut indexer = BackgroundIndexer::new(
            self.store.clone(),
            self.loaded.clone(),
            config,
            workspace.clone(),
        );
        if let Some(progress) = &self.progress {
            indexer = indexer.with_progress(progress.clone());
        }

        match indexer.spawn() {
            Ok(handle) => {
                info!(scope = %workspace.id, folders = workspace.folders.len(), "Loading folders");
                Some(handle)
            }
            Err(e) => {
                warn!(scope = %workspace.id, error = %e, "Could not start indexer");
                None
            }
        }
    }

    /// Rescan one buffer into the store.
    pub fn load_view(
        &self,
        settings: &Settings,
        scope: ScopeId,
        buffer: &dyn TextBuffer,
    ) -> RefreshOutcome {
        let config = WorkspaceConfig::resolve(settings);
        self.refresher.refresh(buffer, &config, scope)
    }

    /// A file was opened: load the workspace folders, then the buffer itself.
    pub fn on_file_opened(
        &self,
        settings: &Settings,
        workspace: &Workspace,
        buffer: &dyn TextBuffer,
    ) -> Option<IndexerHandle> {
        let handle = self.load_folders(settings, workspace);
        self.load_view(settings, workspace.id, buffer);
        handle
    }

    /// A file was saved: rescan the buffer.
    pub fn on_file_saved(
        &self,
        settings: &Settings,
        scope: ScopeId,
        buffer: &dyn TextBuffer,
    ) -> RefreshOutcome {
        self.load_view(settings, scope, buffer)
    }

    /// Show every symbol visible to `scope`. Returns the listed symbols.
    pub fn list_all(
        &self,
        settings: &Settings,
        scope: ScopeId,
        sink: &dyn DisplaySink,
    ) -> Vec<Symbol> {
        let symbols = self.store.list_all(scope);
        self.show_symbols(settings, &symbols, sink);
        symbols
    }

    /// Show the symbols visible to `scope` whose text contains `word`.
    pub fn find_at_cursor(
        &self,
        settings: &Settings,
        scope: ScopeId,
        word: &str,
        sink: &dyn DisplaySink,
    ) -> Vec<Symbol> {
        let symbols = self.store.find_by_name_substring(word, scope);
        self.show_symbols(settings, &symbols, sink);
        symbols
    }

    /// Present a result list.
    ///
    /// No results show a status message, one result jumps straight to it,
    /// more open a panel and jump to the picked row. Returns the symbol jumped
    /// to, if any.
    pub fn show_symbols(
        &self,
        settings: &Settings,
        symbols: &[Symbol],
        sink: &dyn DisplaySink,
    ) -> Option<Symbol> {
        let chosen = match symbols.len() {
            0 => {
                sink.status(EMPTY_SYMBOL);
                return None;
            }
            1 => &symbols[0],
            _ => {
                let items = render(symbols, settings.goto_symbol.display_filename);
                let index = sink.choose(&items)?;
                symbols.get(index)?
            }
        };
        sink.jump_to(&chosen.source_path, chosen.line);
        Some(chosen.clone())
    }
}

/// The identifier-like word touching byte `offset` of `text`.
///
/// Word characters are alphanumerics and `_`. Returns `None` when the cursor
/// touches no word.
pub fn word_at(text: &str, offset: usize) -> Option<&str> {
    if offset > text.len() || !text.is_char_boundary(offset) {
        return None;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    let start = text[..offset]
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_word(c))
        .last()
        .map_or(offset, |(i, _)| i);
    let end = text[offset..]
        .char_indices()
        .find(|&(_, c)| !is_word(c))
        .map_or(text.len(), |(i, _)| offset + i);

    if start == end {
        None
    } else {
        Some(&text[start..end])
    }
}
