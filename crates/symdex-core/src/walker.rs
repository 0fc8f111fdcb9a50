//! Recursive directory walking.
//!
//! Walks each root folder with `walkdir`, pruning excluded directories before
//! descending into them, and keeps only files whose extension maps to a
//! configured language.

use crate::config::WorkspaceConfig;
use crate::types::FileDescriptor;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// The merged directory exclusion patterns, compiled as one alternation.
#[derive(Debug, Clone, Default)]
pub struct ExclusionMatcher {
    regex: Option<Regex>,
}

impl ExclusionMatcher {
    /// Compile `patterns` into `(p1|p2|...)`.
    ///
    /// A pattern that does not compile on its own is dropped. No patterns
    /// means nothing is excluded.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let valid: Vec<&str> = patterns
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| match Regex::new(p) {
                Ok(_) => true,
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Dropping folder exclude pattern");
                    false
                }
            })
            .collect();

        if valid.is_empty() {
            return ExclusionMatcher { regex: None };
        }

        let joined = format!("({})", valid.join("|"));
        match Regex::new(&joined) {
            Ok(regex) => ExclusionMatcher { regex: Some(regex) },
            Err(e) => {
                warn!(pattern = %joined, error = %e, "Folder exclude patterns do not combine");
                ExclusionMatcher { regex: None }
            }
        }
    }

    /// Whether a directory path matches any exclusion pattern.
    pub fn is_excluded(&self, dir: &Path) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(&dir.to_string_lossy()),
            None => false,
        }
    }
}

type PruneFn = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Enumerates indexable files under a set of roots.
pub struct DirectoryWalker {
    config: WorkspaceConfig,
    exclusion: ExclusionMatcher,
    prune: Option<PruneFn>,
}

impl DirectoryWalker {
    /// Create a walker using the config's exclusion patterns and languages.
    pub fn new(config: &WorkspaceConfig) -> Self {
        DirectoryWalker {
            config: config.clone(),
            exclusion: ExclusionMatcher::new(config.exclude_patterns.as_slice()),
            prune: None,
        }
    }

    /// Also skip any sub-directory (never a root) for which `prune` returns true.
    pub fn with_prune(mut self, prune: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
        self.prune = Some(Box::new(prune));
        self
    }

    fn keep_entry(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }
        if self.exclusion.is_excluded(entry.path()) {
            debug!(dir = %entry.path().display(), "Pruning excluded directory");
            return false;
        }
        if entry.depth() > 0 {
            if let Some(prune) = &self.prune {
                if prune(entry.path()) {
                    debug!(
                        dir = %entry.path().display(),
                        "Pruning directory owned by another walk"
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Walk one root folder.
    pub fn walk_root<'w>(&'w self, root: &'w Path) -> impl Iterator<Item = FileDescriptor> + 'w {
        WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| self.keep_entry(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                let rule = self.config.language_for_path(entry.path())?;
                Some(FileDescriptor {
                    root: root.to_path_buf(),
                    path: entry.into_path(),
                    language: rule.language().to_string(),
                })
            })
    }

    /// Walk every root folder in order.
    pub fn walk<'w>(&'w self, roots: &'w [PathBuf]) -> impl Iterator<Item = FileDescriptor> + 'w {
        roots.iter().flat_map(move |root| self.walk_root(root))
    }
}

/// Collect every indexable file under `roots`.
pub fn walk(roots: &[PathBuf], config: &WorkspaceConfig) -> Vec<FileDescriptor> {
    DirectoryWalker::new(config).walk(roots).collect()
}
