//! Core data types for Symdex.
//!
//! This module defines the values passed between the scanners, the store and
//! the host:
//!
//! - **Symbols** are immutable once built; the store only appends or drops them
//! - **Scopes** tie a symbol to the workspace that indexed it
//! - **Occurrences** are the raw `(line, text)` pairs a scanner produces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of the workspace that owns a symbol.
///
/// `ScopeId::GLOBAL` (zero) marks a symbol visible to every workspace. Hosts
/// with no notion of a window or session use it for everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u64);

impl ScopeId {
    /// The scope visible to all workspaces
    pub const GLOBAL: ScopeId = ScopeId(0);

    /// Create a new scope ID
    pub fn new(id: u64) -> Self {
        ScopeId(id)
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// True for the global scope
    pub fn is_global(&self) -> bool {
        self.0 == 0
    }

    /// Whether a symbol tagged with `self` is visible from workspace `viewer`.
    pub fn visible_to(&self, viewer: ScopeId) -> bool {
        self.is_global() || *self == viewer
    }
}

impl Default for ScopeId {
    fn default() -> Self {
        ScopeId::GLOBAL
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `(line, text)` hit produced by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// 1-based line number
    pub line: usize,

    /// Matched text
    pub text: String,
}

impl Occurrence {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Occurrence {
            line,
            text: text.into(),
        }
    }
}

/// A symbol extracted from a source file.
///
/// ## Design Notes
///
/// - `display_name` is the last path component, precomputed for panel rendering
/// - `raw_text` is both the label shown to the user and the search key
/// - Equality covers every field; the store relies on clear-before-reinsert
///   rather than on a key to avoid duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Absolute path of the file the symbol came from
    pub source_path: PathBuf,

    /// File name without directories (e.g., "main.py")
    pub display_name: String,

    /// 1-based line of the match
    pub line: usize,

    /// Full matched text
    pub raw_text: String,

    /// Owning workspace
    pub scope: ScopeId,
}

impl Symbol {
    /// Create a new symbol.
    ///
    /// The `display_name` is derived from `source_path`.
    pub fn new(
        source_path: impl Into<PathBuf>,
        line: usize,
        raw_text: impl Into<String>,
        scope: ScopeId,
    ) -> Self {
        let source_path = source_path.into();
        let display_name = display_name_of(&source_path);
        Symbol {
            source_path,
            display_name,
            line,
            raw_text: raw_text.into(),
            scope,
        }
    }

    /// Build a symbol from a scanner occurrence
    pub fn from_occurrence(source_path: &Path, occurrence: Occurrence, scope: ScopeId) -> Self {
        Symbol::new(source_path, occurrence.line, occurrence.text, scope)
    }

    /// Leading whitespace of the raw text, used to align the filename row
    pub fn indentation(&self) -> &str {
        let trimmed = self.raw_text.trim_start_matches([' ', '\t']);
        &self.raw_text[..self.raw_text.len() - trimmed.len()]
    }

    /// `path:line` location string
    pub fn location(&self) -> String {
        format!("{}:{}", self.source_path.display(), self.line)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]{}[:{}] {}",
            self.scope,
            self.source_path.display(),
            self.line,
            self.raw_text
        )
    }
}

fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A file discovered by the directory walker, with its resolved language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Root folder the walk started from
    pub root: PathBuf,

    /// Full path of the file
    pub path: PathBuf,

    /// Language id whose pattern rule applies to this file
    pub language: String,
}

/// A workspace as reported by the host: an id and its folder roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub id: ScopeId,
    pub folders: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(id: ScopeId, folders: Vec<PathBuf>) -> Self {
        Workspace { id, folders }
    }
}

/// Statistics about the symbol store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of symbols
    pub symbols: u64,

    /// Number of distinct source files
    pub files: u64,

    /// When the store was last modified
    pub last_updated: Option<DateTime<Utc>>,
}
