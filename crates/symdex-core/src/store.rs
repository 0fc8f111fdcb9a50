//! In-memory symbol store.
//!
//! The `SymbolStore` is the single shared collection of every symbol indexed
//! in this process, across all workspaces. It supports:
//!
//! - Appending symbols from background walks and live refreshes
//! - Wholesale removal of one file's symbols before that file is rescanned
//! - Scope-filtered listing and substring search
//!
//! ## Architecture
//!
//! A `Vec<Symbol>` behind a `parking_lot::RwLock` keeps insertion order and
//! cheap iteration. Symbols are never edited in place, only appended or
//! removed, so a query copies what it needs under the read lock and releases
//! it. There is no key: a file's symbols are unique because every rescan
//! clears the file before reinserting.

use crate::types::{ScopeId, StoreStats, Symbol};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

/// Above this many symbols, queries filter in parallel.
const PARALLEL_THRESHOLD: usize = 10_000;

/// The shared symbol collection.
///
/// Safe to share through an `Arc`: mutations are serialized by the write
/// lock, queries run concurrently under the read lock.
///
/// ## Example
///
/// ```rust
/// use symdex_core::{ScopeId, Symbol, SymbolStore};
///
/// let store = SymbolStore::new();
/// store.append(Symbol::new("/w/a.py", 1, "def foo():", ScopeId::new(1)));
///
/// assert_eq!(store.list_all(ScopeId::new(1)).len(), 1);
/// assert!(store.list_all(ScopeId::new(2)).is_empty());
/// ```
pub struct SymbolStore {
    /// All symbols, in insertion order
    symbols: RwLock<Vec<Symbol>>,

    /// Last modification time
    last_updated: RwLock<Option<chrono::DateTime<chrono::Utc>>>,

    /// Generation counter for detecting concurrent modifications
    generation: AtomicU64,
}

impl Default for SymbolStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        SymbolStore {
            symbols: RwLock::new(Vec::new()),
            last_updated: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a store with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        SymbolStore {
            symbols: RwLock::new(Vec::with_capacity(capacity)),
            last_updated: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Get the number of symbols in the store.
    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }

    /// Get the current generation (modification counter).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn touch(&self) {
        *self.last_updated.write() = Some(chrono::Utc::now());
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Append one symbol.
    pub fn append(&self, symbol: Symbol) {
        self.symbols.write().push(symbol);
        self.touch();
    }

    /// Append a batch of symbols under a single lock.
    pub fn extend(&self, symbols: impl IntoIterator<Item = Symbol>) {
        self.symbols.write().extend(symbols);
        self.touch();
    }

    /// Remove every symbol whose source is `path`. Returns how many were removed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn clear_file(&self, path: &Path) -> usize {
        let removed = remove_file(&mut self.symbols.write(), path);
        if removed > 0 {
            debug!(removed, "Cleared file symbols");
            self.touch();
        }
        removed
    }

    /// Replace a file's symbols atomically.
    ///
    /// Readers see either the old set or the new one, never a mix and never
    /// both.
    #[instrument(skip(self, symbols), fields(path = %path.display()))]
    pub fn replace_file(&self, path: &Path, symbols: Vec<Symbol>) -> usize {
        let added = symbols.len();
        {
            let mut all = self.symbols.write();
            let removed = remove_file(&mut all, path);
            all.extend(symbols);
            debug!(removed, added, "Replaced file symbols");
        }
        self.touch();
        added
    }

    /// All symbols visible to `scope`, in store order.
    pub fn list_all(&self, scope: ScopeId) -> Vec<Symbol> {
        self.filter(|s| s.scope.visible_to(scope))
    }

    /// Symbols visible to `scope` whose text contains `query` (case-sensitive).
    ///
    /// An empty query matches nothing.
    pub fn find_by_name_substring(&self, query: &str, scope: ScopeId) -> Vec<Symbol> {
        if query.is_empty() {
            return Vec::new();
        }
        self.filter(|s| s.scope.visible_to(scope) && s.raw_text.contains(query))
    }

    /// Symbols from one file, in store order.
    pub fn symbols_in_file(&self, path: &Path) -> Vec<Symbol> {
        self.filter(|s| s.source_path == path)
    }

    fn filter<F>(&self, predicate: F) -> Vec<Symbol>
    where
        F: Fn(&Symbol) -> bool + Sync,
    {
        let symbols = self.symbols.read();

        if symbols.len() > PARALLEL_THRESHOLD {
            symbols
                .par_iter()
                .filter(|s| predicate(s))
                .cloned()
                .collect()
        } else {
            symbols.iter().filter(|s| predicate(s)).cloned().collect()
        }
    }

    /// Sort the whole store by symbol text.
    ///
    /// Not part of any default path: listings come back in insertion order
    /// unless a host calls this explicitly. The sort is stable.
    pub fn sort_by_name(&self) {
        self.symbols
            .write()
            .sort_by(|a, b| a.raw_text.cmp(&b.raw_text));
        self.touch();
    }

    /// Get current store statistics.
    pub fn stats(&self) -> StoreStats {
        let symbols = self.symbols.read();
        let files: HashSet<&Path> = symbols.iter().map(|s| s.source_path.as_path()).collect();
        StoreStats {
            symbols: symbols.len() as u64,
            files: files.len() as u64,
            last_updated: *self.last_updated.read(),
        }
    }

    /// Get a copy of all symbols regardless of scope.
    pub fn all_symbols(&self) -> Vec<Symbol> {
        self.symbols.read().clone()
    }

    /// Clear the entire store.
    pub fn clear(&self) {
        self.symbols.write().clear();
        self.touch();
    }
}

fn remove_file(symbols: &mut Vec<Symbol>, path: &Path) -> usize {
    let before = symbols.len();
    symbols.retain(|s| s.source_path != path);
    before - symbols.len()
}

impl std::fmt::Debug for SymbolStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolStore")
            .field("symbol_count", &self.len())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::thread;

    fn make_test_symbols() -> Vec<Symbol> {
        vec![
            Symbol::new("/w/a.py", 1, "def foo():", ScopeId::new(1)),
            Symbol::new("/w/a.py", 5, "def bar():", ScopeId::new(1)),
            Symbol::new("/w/b.py", 2, "class Foo:", ScopeId::new(2)),
            Symbol::new("/lib/c.py", 9, "def food():", ScopeId::GLOBAL),
        ]
    }

    fn make_store() -> SymbolStore {
        let store = SymbolStore::new();
        store.extend(make_test_symbols());
        store
    }

    fn texts(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.raw_text.as_str()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let store = SymbolStore::new();
        for symbol in make_test_symbols() {
            store.append(symbol);
        }
        assert_eq!(store.len(), 4);
        assert_eq!(
            texts(&store.all_symbols()),
            vec!["def foo():", "def bar():", "class Foo:", "def food():"]
        );
    }

    #[test]
    fn test_list_all_scope_filter() {
        let store = make_store();

        assert_eq!(
            texts(&store.list_all(ScopeId::new(1))),
            vec!["def foo():", "def bar():", "def food():"]
        );
        assert_eq!(
            texts(&store.list_all(ScopeId::new(2))),
            vec!["class Foo:", "def food():"]
        );
        assert_eq!(texts(&store.list_all(ScopeId::new(99))), vec!["def food():"]);
    }

    #[test]
    fn test_global_visible_everywhere() {
        let store = make_store();
        for scope in [0, 1, 2, 3, u64::MAX] {
            let listed = store.list_all(ScopeId::new(scope));
            assert!(listed.iter().any(|s| s.raw_text == "def food():"));
        }
    }

    #[test]
    fn test_find_by_name_substring() {
        let store = make_store();

        let found = store.find_by_name_substring("foo", ScopeId::new(1));
        assert_eq!(texts(&found), vec!["def foo():", "def food():"]);

        // case-sensitive
        let found = store.find_by_name_substring("Foo", ScopeId::new(1));
        assert!(found.is_empty());
        let found = store.find_by_name_substring("Foo", ScopeId::new(2));
        assert_eq!(texts(&found), vec!["class Foo:"]);
    }

    #[test]
    fn test_empty_query_finds_nothing() {
        let store = make_store();
        for scope in [0, 1, 2] {
            assert!(store
                .find_by_name_substring("", ScopeId::new(scope))
                .is_empty());
        }
    }

    #[test]
    fn test_clear_file() {
        let store = make_store();
        let removed = store.clear_file(Path::new("/w/a.py"));
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 2);
        assert!(store.symbols_in_file(Path::new("/w/a.py")).is_empty());

        // exact path only, no prefix matches
        assert_eq!(store.clear_file(Path::new("/w/a")), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_replace_file_is_idempotent() {
        let store = make_store();
        let path = PathBuf::from("/w/a.py");
        let fresh = vec![
            Symbol::new(&path, 1, "def foo():", ScopeId::new(1)),
            Symbol::new(&path, 7, "def baz():", ScopeId::new(1)),
        ];

        store.replace_file(&path, fresh.clone());
        let first = store.symbols_in_file(&path);
        store.replace_file(&path, fresh.clone());
        let second = store.symbols_in_file(&path);

        assert_eq!(first, fresh);
        assert_eq!(first, second);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_sort_by_name_is_opt_in() {
        let store = make_store();
        assert_eq!(store.all_symbols()[0].raw_text, "def foo():");

        store.sort_by_name();
        assert_eq!(
            texts(&store.all_symbols()),
            vec!["class Foo:", "def bar():", "def foo():", "def food():"]
        );
    }

    #[test]
    fn test_stats() {
        let store = make_store();
        let stats = store.stats();
        assert_eq!(stats.symbols, 4);
        assert_eq!(stats.files, 3);
        assert!(stats.last_updated.is_some());
    }

    #[test]
    fn test_generation() {
        let store = SymbolStore::new();
        let gen1 = store.generation();
        store.extend(make_test_symbols());
        let gen2 = store.generation();
        assert!(gen2 > gen1);

        // clearing an unknown file is not a modification
        store.clear_file(Path::new("/nowhere"));
        assert_eq!(store.generation(), gen2);
    }

    #[test]
    fn test_parallel_filter_keeps_order() {
        let store = SymbolStore::with_capacity(PARALLEL_THRESHOLD + 10);
        store.extend((0..PARALLEL_THRESHOLD + 10).map(|i| {
            Symbol::new(
                format!("/w/f{}.py", i % 7),
                i + 1,
                format!("def f{}():", i),
                ScopeId::new(1),
            )
        }));

        let listed = store.list_all(ScopeId::new(1));
        assert_eq!(listed.len(), PARALLEL_THRESHOLD + 10);
        assert!(listed.windows(2).all(|w| w[0].line < w[1].line));
    }

    #[test]
    fn test_concurrent_replace_never_duplicates() {
        let store = Arc::new(SymbolStore::new());
        let path = PathBuf::from("/w/hot.py");
        let fresh: Vec<Symbol> = (1..=5)
            .map(|i| Symbol::new(&path, i, format!("def f{}():", i), ScopeId::new(1)))
            .collect();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                let path = path.clone();
                let fresh = fresh.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        store.replace_file(&path, fresh.clone());
                        let seen = store.symbols_in_file(&path);
                        assert_eq!(seen.len(), 5);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.symbols_in_file(&path), fresh);
    }
}
