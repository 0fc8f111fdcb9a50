//! Background workspace indexing.
//!
//! A `BackgroundIndexer` walks a workspace's folders on its own thread,
//! scanning every file the walker yields and replacing that file's entries in
//! the shared [`SymbolStore`]. The interactive side keeps an [`IndexerHandle`]
//! and polls [`IndexerHandle::is_done`]; it never waits on the thread.
//!
//! ## Folder claims
//!
//! [`LoadedFolderSet`] records every folder root a run has claimed. A claim is
//! taken under a mutex before any file of that folder is scanned, and a folder
//! is claimed at most once per process. Claims also cover nesting: a folder
//! inside an already claimed root cannot be claimed, and a run skips any
//! sub-directory that another run claimed as its root. Two workspaces opened
//! together on overlapping trees therefore scan each file once.

use crate::config::WorkspaceConfig;
use crate::error::Result;
use crate::scanner::scan_file;
use crate::store::SymbolStore;
use crate::types::{ScopeId, Symbol, Workspace};
use crate::walker::DirectoryWalker;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, instrument, warn};

/// How many files between two progress callbacks.
const PROGRESS_EVERY: u64 = 100;

/// Folder roots already walked in this process.
#[derive(Debug, Default)]
pub struct LoadedFolderSet {
    folders: Mutex<HashSet<PathBuf>>,
}

impl LoadedFolderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `folder` for walking.
    ///
    /// Fails when the folder, or a folder containing it, is already claimed.
    pub fn claim(&self, folder: &Path) -> bool {
        let mut folders = self.folders.lock();
        if folders.iter().any(|claimed| folder.starts_with(claimed)) {
            return false;
        }
        folders.insert(folder.to_path_buf())
    }

    /// True when `path` lies inside (or is) a claimed root.
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.folders
            .lock()
            .iter()
            .any(|claimed| path.starts_with(claimed))
    }

    /// True when `dir` itself is a claimed root.
    pub fn contains_root(&self, dir: &Path) -> bool {
        self.folders.lock().contains(dir)
    }

    pub fn len(&self) -> usize {
        self.folders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.lock().is_empty()
    }
}

/// Lifecycle of one indexer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexerState {
    Idle,
    Running,
    Done,
}

impl IndexerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => IndexerState::Idle,
            1 => IndexerState::Running,
            _ => IndexerState::Done,
        }
    }
}

impl fmt::Display for IndexerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexerState::Idle => write!(f, "idle"),
            IndexerState::Running => write!(f, "running"),
            IndexerState::Done => write!(f, "done"),
        }
    }
}

/// Progress reporting for indexer runs
pub trait ScanProgress: Send + Sync {
    /// Called when a folder has been claimed and its walk begins
    fn on_folder_start(&self, folder: &Path);

    /// Called periodically with running totals
    fn on_progress(&self, files_scanned: u64, symbols_found: u64);

    /// Called once when the run finishes
    fn on_complete(&self, files_scanned: u64, symbols_found: u64);
}

/// A simple progress reporter that logs to tracing
pub struct LoggingProgress {
    scope: ScopeId,
}

impl LoggingProgress {
    pub fn new(scope: ScopeId) -> Self {
        LoggingProgress { scope }
    }
}

impl ScanProgress for LoggingProgress {
    fn on_folder_start(&self, folder: &Path) {
        tracing::debug!(scope = %self.scope, folder = %folder.display(), "Walking folder");
    }

    fn on_progress(&self, files_scanned: u64, symbols_found: u64) {
        tracing::debug!(
            scope = %self.scope,
            files = files_scanned,
            symbols = symbols_found,
            "Indexing progress"
        );
    }

    fn on_complete(&self, files_scanned: u64, symbols_found: u64) {
        tracing::info!(
            scope = %self.scope,
            files = files_scanned,
            symbols = symbols_found,
            "Indexing complete"
        );
    }
}

/// Progress messages sent by [`ChannelProgress`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexerEvent {
    FolderStarted(PathBuf),
    Progress { files: u64, symbols: u64 },
    Complete { files: u64, symbols: u64 },
}

/// A channel-based progress reporter
pub struct ChannelProgress {
    sender: crossbeam_channel::Sender<IndexerEvent>,
}

impl ChannelProgress {
    /// Create a new channel-based reporter
    pub fn new() -> (Self, crossbeam_channel::Receiver<IndexerEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelProgress { sender }, receiver)
    }
}

impl ScanProgress for ChannelProgress {
    fn on_folder_start(&self, folder: &Path) {
        let _ = self
            .sender
            .send(IndexerEvent::FolderStarted(folder.to_path_buf()));
    }

    fn on_progress(&self, files_scanned: u64, symbols_found: u64) {
        let _ = self.sender.send(IndexerEvent::Progress {
            files: files_scanned,
            symbols: symbols_found,
        });
    }

    fn on_complete(&self, files_scanned: u64, symbols_found: u64) {
        let _ = self.sender.send(IndexerEvent::Complete {
            files: files_scanned,
            symbols: symbols_found,
        });
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone)]
pub struct IndexerReport {
    pub scope: ScopeId,
    /// Folders this run claimed and walked
    pub folders_walked: usize,
    /// Folders already claimed by an earlier or concurrent run
    pub folders_skipped: usize,
    pub files_scanned: u64,
    /// Files that could not be read (counted in `files_scanned`)
    pub files_failed: u64,
    pub symbols_found: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The indexer thread panicked; counts are whatever was reached
    pub panicked: bool,
}

/// State shared between the indexer thread and its handle.
#[derive(Debug, Default)]
struct SharedState {
    state: AtomicU8,
    files: AtomicU64,
    symbols: AtomicU64,
}

impl SharedState {
    fn set(&self, state: IndexerState) {
        let value = match state {
            IndexerState::Idle => 0,
            IndexerState::Running => 1,
            IndexerState::Done => 2,
        };
        self.state.store(value, Ordering::Release);
    }

    fn get(&self) -> IndexerState {
        IndexerState::from_u8(self.state.load(Ordering::Acquire))
    }
}

/// Flips the run to `Done` however the thread exits.
struct DoneGuard<'s>(&'s SharedState);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.set(IndexerState::Done);
    }
}

/// One workspace-open indexing run.
pub struct BackgroundIndexer {
    store: Arc<SymbolStore>,
    loaded: Arc<LoadedFolderSet>,
    config: WorkspaceConfig,
    workspace: Workspace,
    progress: Option<Arc<dyn ScanProgress>>,
    shared: Arc<SharedState>,
}

impl BackgroundIndexer {
    pub fn new(
        store: Arc<SymbolStore>,
        loaded: Arc<LoadedFolderSet>,
        config: WorkspaceConfig,
        workspace: Workspace,
    ) -> Self {
        BackgroundIndexer {
            store,
            loaded,
            config,
            workspace,
            progress: None,
            shared: Arc::new(SharedState::default()),
        }
    }

    /// Report progress to `progress` as well as the handle counters.
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> IndexerState {
        self.shared.get()
    }

    /// Start the run on a dedicated thread.
    pub fn spawn(self) -> Result<IndexerHandle> {
        let shared = self.shared.clone();
        let scope = self.workspace.id;
        shared.set(IndexerState::Running);

        let spawned = thread::Builder::new()
            .name(format!("symdex-indexer-{}", scope))
            .spawn(move || self.run());

        match spawned {
            Ok(thread) => Ok(IndexerHandle {
                scope,
                shared,
                started_at: Utc::now(),
                thread: Some(thread),
            }),
            Err(e) => {
                shared.set(IndexerState::Done);
                Err(e.into())
            }
        }
    }

    /// Run to completion on the calling thread.
    #[instrument(skip(self), fields(scope = %self.workspace.id))]
    pub fn run(&self) -> IndexerReport {
        let _done = DoneGuard(&self.shared);
        self.shared.set(IndexerState::Running);

        let scope = self.workspace.id;
        let started_at = Utc::now();
        let mut report = IndexerReport {
            scope,
            folders_walked: 0,
            folders_skipped: 0,
            files_scanned: 0,
            files_failed: 0,
            symbols_found: 0,
            started_at,
            finished_at: started_at,
            panicked: false,
        };

        info!(folders = self.workspace.folders.len(), "Starting background index");

        for folder in &self.workspace.folders {
            if !self.loaded.claim(folder) {
                debug!(folder = %folder.display(), "Folder already loaded, skipping");
                report.folders_skipped += 1;
                continue;
            }
            report.folders_walked += 1;
            if let Some(progress) = &self.progress {
                progress.on_folder_start(folder);
            }
            self.index_folder(folder, &mut report);
        }

        report.finished_at = Utc::now();
        if let Some(progress) = &self.progress {
            progress.on_complete(report.files_scanned, report.symbols_found);
        }
        info!(
            walked = report.folders_walked,
            skipped = report.folders_skipped,
            files = report.files_scanned,
            failed = report.files_failed,
            symbols = report.symbols_found,
            "Background index finished"
        );
        report
    }

    fn index_folder(&self, folder: &Path, report: &mut IndexerReport) {
        let loaded = self.loaded.clone();
        let walker =
            DirectoryWalker::new(&self.config).with_prune(move |dir| loaded.contains_root(dir));

        for file in walker.walk_root(folder) {
            let Some(rule) = self.config.langs.get(&file.language) else {
                continue;
            };

            let symbols: Vec<Symbol> = match scan_file(&file.path, rule) {
                Ok(occurrences) => occurrences
                    .into_iter()
                    .map(|o| Symbol::from_occurrence(&file.path, o, self.workspace.id))
                    .collect(),
                Err(e) => {
                    debug!(file = %file.path.display(), error = %e, "Scan failed, no symbols");
                    report.files_failed += 1;
                    Vec::new()
                }
            };

            report.files_scanned += 1;
            report.symbols_found += self.store.replace_file(&file.path, symbols) as u64;
            self.shared.files.store(report.files_scanned, Ordering::Relaxed);
            self.shared
                .symbols
                .store(report.symbols_found, Ordering::Relaxed);

            if report.files_scanned % PROGRESS_EVERY == 0 {
                if let Some(progress) = &self.progress {
                    progress.on_progress(report.files_scanned, report.symbols_found);
                }
            }
        }
    }
}

/// Handle to a running indexer, kept by the interactive side.
pub struct IndexerHandle {
    scope: ScopeId,
    shared: Arc<SharedState>,
    started_at: DateTime<Utc>,
    thread: Option<JoinHandle<IndexerReport>>,
}

impl IndexerHandle {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The polled completion flag.
    pub fn is_done(&self) -> bool {
        self.shared.get() == IndexerState::Done
    }

    pub fn state(&self) -> IndexerState {
        self.shared.get()
    }

    pub fn files_scanned(&self) -> u64 {
        self.shared.files.load(Ordering::Relaxed)
    }

    pub fn symbols_found(&self) -> u64 {
        self.shared.symbols.load(Ordering::Relaxed)
    }

    /// Wait for the thread and return its report.
    pub fn join(mut self) -> IndexerReport {
        let thread = self.thread.take();
        match thread.map(JoinHandle::join) {
            Some(Ok(report)) => report,
            Some(Err(_)) | None => {
                warn!(scope = %self.scope, "Indexer thread panicked");
                IndexerReport {
                    scope: self.scope,
                    folders_walked: 0,
                    folders_skipped: 0,
                    files_scanned: self.files_scanned(),
                    files_failed: 0,
                    symbols_found: self.symbols_found(),
                    started_at: self.started_at,
                    finished_at: Utc::now(),
                    panicked: true,
                }
            }
        }
    }
}

impl fmt::Debug for IndexerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerHandle")
            .field("scope", &self.scope)
            .field("state", &self.state())
            .field("files_scanned", &self.files_scanned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternRule;
    use std::fs;
    use tempfile::TempDir;

    fn python_config() -> WorkspaceConfig {
        WorkspaceConfig::default()
            .with_rule(PatternRule::new("Python", &["py"], &["def .*"]).unwrap())
    }

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn indexer(
        store: &Arc<SymbolStore>,
        loaded: &Arc<LoadedFolderSet>,
        scope: u64,
        folders: Vec<PathBuf>,
    ) -> BackgroundIndexer {
        BackgroundIndexer::new(
            store.clone(),
            loaded.clone(),
            python_config(),
            Workspace::new(ScopeId::new(scope), folders),
        )
    }

    #[test]
    fn test_claim_rules() {
        let loaded = LoadedFolderSet::new();
        assert!(loaded.claim(Path::new("/w/project")));
        assert!(!loaded.claim(Path::new("/w/project")));
        assert!(!loaded.claim(Path::new("/w/project/src")));
        assert!(loaded.claim(Path::new("/w/project-two")));
        assert!(loaded.claim(Path::new("/w/other")));

        assert!(loaded.is_claimed(Path::new("/w/project/src/lib")));
        assert!(!loaded.is_claimed(Path::new("/w")));
        assert!(loaded.contains_root(Path::new("/w/other")));
        assert!(!loaded.contains_root(Path::new("/w/project/src")));
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_run_indexes_and_tags_scope() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("a.py"), "def foo():\n  x=1\ndef bar():\n");
        write(&root.join("notes.txt"), "def not_code\n");

        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());
        let run = indexer(&store, &loaded, 4, vec![root.clone()]);
        assert_eq!(run.state(), IndexerState::Idle);

        let report = run.run();
        assert_eq!(run.state(), IndexerState::Done);
        assert_eq!(report.folders_walked, 1);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.symbols_found, 2);

        let listed = store.list_all(ScopeId::new(4));
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|s| s.scope == ScopeId::new(4)));
        assert!(store.list_all(ScopeId::new(5)).is_empty());
    }

    #[test]
    fn test_folder_is_walked_once_per_process() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("a.py"), "def foo():\n");

        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());

        let first = indexer(&store, &loaded, 1, vec![root.clone()]).run();
        let second = indexer(&store, &loaded, 2, vec![root.clone()]).run();

        assert_eq!(first.files_scanned, 1);
        assert_eq!(second.folders_skipped, 1);
        assert_eq!(second.files_scanned, 0);

        // scope stays with the workspace that triggered the walk
        assert_eq!(store.list_all(ScopeId::new(1)).len(), 1);
        assert!(store.list_all(ScopeId::new(2)).is_empty());
    }

    #[test]
    fn test_bad_file_does_not_abort_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("good.py"), "def good():\n");
        fs::write(root.join("binary.py"), b"\x00\x01def hidden():\n").unwrap();

        let store = Arc::new(SymbolStore::new());
        store.append(Symbol::new(root.join("binary.py"), 1, "def stale():", ScopeId::new(1)));
        let loaded = Arc::new(LoadedFolderSet::new());

        let report = indexer(&store, &loaded, 1, vec![root.clone()]).run();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.files_failed, 1);

        let texts: Vec<_> = store
            .list_all(ScopeId::new(1))
            .into_iter()
            .map(|s| s.raw_text)
            .collect();
        assert_eq!(texts, vec!["def good():"]);
    }

    #[test]
    fn test_run_replaces_live_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        let file = root.join("a.py");
        write(&file, "def foo():\n");

        let store = Arc::new(SymbolStore::new());
        store.append(Symbol::new(&file, 1, "def foo():", ScopeId::new(1)));
        let loaded = Arc::new(LoadedFolderSet::new());

        indexer(&store, &loaded, 1, vec![root]).run();
        assert_eq!(store.symbols_in_file(&file).len(), 1);
    }

    #[test]
    fn test_spawn_and_poll() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        for i in 0..20 {
            write(&root.join(format!("m{}.py", i)), "def f():\ndef g():\n");
        }

        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());
        let handle = indexer(&store, &loaded, 9, vec![root]).spawn().unwrap();
        assert_eq!(handle.scope(), ScopeId::new(9));

        while !handle.is_done() {
            thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(handle.state(), IndexerState::Done);
        assert_eq!(handle.files_scanned(), 20);

        let report = handle.join();
        assert!(!report.panicked);
        assert_eq!(report.symbols_found, 40);
        assert_eq!(store.len(), 40);
    }

    #[test]
    fn test_concurrent_workspaces_share_folder_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("a").join("a.py"), "def a():\n");
        write(&root.join("b").join("b.py"), "def b():\n");
        for i in 0..30 {
            write(&root.join("shared").join(format!("s{}.py", i)), "def s():\n");
        }

        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());
        let first = indexer(&store, &loaded, 1, vec![root.join("a"), root.join("shared")])
            .spawn()
            .unwrap();
        let second = indexer(&store, &loaded, 2, vec![root.join("shared"), root.join("b")])
            .spawn()
            .unwrap();

        let first = first.join();
        let second = second.join();

        assert_eq!(first.files_scanned + second.files_scanned, 32);
        assert_eq!(first.folders_skipped + second.folders_skipped, 1);
        assert_eq!(store.len(), 32);
    }

    #[test]
    fn test_nested_workspaces_scan_once() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("top.py"), "def top():\n");
        for i in 0..30 {
            write(&root.join("sub").join(format!("s{}.py", i)), "def s():\n");
        }

        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());
        let outer = indexer(&store, &loaded, 1, vec![root.clone()]).spawn().unwrap();
        let inner = indexer(&store, &loaded, 2, vec![root.join("sub")])
            .spawn()
            .unwrap();

        let outer = outer.join();
        let inner = inner.join();

        assert_eq!(outer.files_scanned + inner.files_scanned, 31);
        assert_eq!(store.len(), 31);
    }

    #[test]
    fn test_channel_progress() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_path_buf();
        write(&root.join("a.py"), "def foo():\n");

        let (progress, receiver) = ChannelProgress::new();
        let store = Arc::new(SymbolStore::new());
        let loaded = Arc::new(LoadedFolderSet::new());
        indexer(&store, &loaded, 1, vec![root.clone()])
            .with_progress(Arc::new(progress))
            .run();

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                IndexerEvent::FolderStarted(root),
                IndexerEvent::Complete {
                    files: 1,
                    symbols: 1
                },
            ]
        );
    }
}
