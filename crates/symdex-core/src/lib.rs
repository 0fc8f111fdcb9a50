//! # Symdex Core Library
//!
//! This crate provides the symbol indexing engine behind Symdex: pattern-driven
//! extraction of named symbols (functions, classes, labels) from the files of
//! a workspace, a shared in-memory store, and the two queries hosts need,
//! "everything in scope" and "names containing this word".
//!
//! ## Architecture
//!
//! - **Config** (`config`): settings file model and per-workspace resolution
//! - **Types** (`types`): symbols, scopes and scanner occurrences
//! - **Scanner** (`scanner`): line-anchored file scans and live-buffer scans
//! - **Store** (`store`): the shared, lock-protected symbol collection
//! - **Walker** (`walker`): recursive folder walks with subtree pruning
//! - **Indexer** (`indexer`): background workspace indexing and folder claims
//! - **Refresher** (`refresher`): synchronous rescans of open buffers
//! - **Service** (`service`): host callbacks wired to all of the above
//! - **Display** / **Status** (`display`, `status`): output to the host UI
//!
//! ## Example
//!
//! ```rust,ignore
//! use symdex_core::{MemoryBuffer, ScopeId, Settings, SymbolService, Workspace};
//!
//! let service = SymbolService::new();
//! let settings = Settings::load()?;
//! let workspace = Workspace::new(ScopeId::new(1), vec!["/src/project".into()]);
//!
//! let buffer = MemoryBuffer::open("/src/project/main.py".as_ref(), "Python")?;
//! if let Some(handle) = service.on_file_opened(&settings, &workspace, &buffer) {
//!     handle.join();
//! }
//! for symbol in service.store().find_by_name_substring("parse", workspace.id) {
//!     println!("{}", symbol.location());
//! }
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod indexer;
pub mod refresher;
pub mod scanner;
pub mod service;
pub mod status;
pub mod store;
pub mod types;
pub mod walker;

// Re-export commonly used types
pub use config::{LangSettings, PatternRule, Settings, WorkspaceConfig};
pub use display::{DisplaySink, PanelItem};
pub use error::{Result, SymdexError};
pub use indexer::{
    BackgroundIndexer, IndexerHandle, IndexerReport, IndexerState, LoadedFolderSet, ScanProgress,
};
pub use refresher::{LiveRefresher, MemoryBuffer, RefreshOutcome, TextBuffer};
pub use scanner::{buffer_symbols, scan_buffer, scan_file, symbol_match, SymbolMatch};
pub use service::{word_at, SymbolService};
pub use store::SymbolStore;
pub use types::{FileDescriptor, Occurrence, ScopeId, Symbol, Workspace};
pub use walker::DirectoryWalker;
