//! Symbol scanners.
//!
//! Two entry points share the compiled [`PatternRule`]:
//!
//! - [`FileScan`] / [`scan_file`] read a file from disk line by line and test
//!   every pattern, in order, anchored at the start of each line.
//! - [`scan_buffer`] searches the text of a live buffer as a whole, the way an
//!   editor's find-all does, and reports the line each match starts on.

use crate::config::PatternRule;
use crate::error::{Result, SymdexError};
use crate::types::{Occurrence, ScopeId, Symbol};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Lazy line-by-line scan of one file.
///
/// Yields one `Ok(Occurrence)` per (line, matching pattern) pair. The first
/// read failure is yielded as an `Err` and ends the iteration.
pub struct FileScan<'r> {
    path: PathBuf,
    rule: &'r PatternRule,
    reader: BufReader<File>,
    line_no: usize,
    buf: Vec<u8>,
    pending: VecDeque<Occurrence>,
    finished: bool,
}

impl<'r> FileScan<'r> {
    /// Open `path` read-only for scanning.
    pub fn open(path: &Path, rule: &'r PatternRule) -> Result<Self> {
        let file = File::open(path).map_err(|e| SymdexError::scan(path, e.to_string()))?;
        Ok(FileScan {
            path: path.to_path_buf(),
            rule,
            reader: BufReader::new(file),
            line_no: 0,
            buf: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        })
    }

    /// Read the next line and queue its matches. Returns false at EOF.
    fn advance(&mut self) -> Result<bool> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| SymdexError::scan(&self.path, e.to_string()))?;
        if read == 0 {
            return Ok(false);
        }
        self.line_no += 1;

        if self.buf.contains(&0) {
            return Err(SymdexError::BinaryFile {
                path: self.path.clone(),
            });
        }
        let line = std::str::from_utf8(&self.buf).map_err(|_| SymdexError::BinaryFile {
            path: self.path.clone(),
        })?;
        let line = line.trim_end_matches(['\n', '\r']);

        for pattern in self.rule.symbol_patterns() {
            if let Some(text) = pattern.match_line(line) {
                self.pending.push_back(Occurrence::new(self.line_no, text));
            }
        }
        Ok(true)
    }
}

impl Iterator for FileScan<'_> {
    type Item = Result<Occurrence>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(occurrence) = self.pending.pop_front() {
                return Some(Ok(occurrence));
            }
            if self.finished {
                return None;
            }
            match self.advance() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Scan a whole file. Any read failure discards the partial result.
pub fn scan_file(path: &Path, rule: &PatternRule) -> Result<Vec<Occurrence>> {
    FileScan::open(path, rule)?.collect()
}

/// Search a live buffer's text with every pattern, in declaration order.
///
/// Matches are case-insensitive and may start anywhere. Each occurrence
/// carries the line its match starts on; a match spanning several lines is
/// labelled with its first non-empty line.
pub fn scan_buffer(text: &str, rule: &PatternRule) -> Vec<Occurrence> {
    let lines = LineIndex::new(text);
    match_ranges(text, rule)
        .filter_map(|range| locate(&lines, text, range))
        .map(|(line, label)| Occurrence::new(line, label))
        .collect()
}

/// Every match of a live buffer as a [`SymbolMatch`], in the order of
/// [`scan_buffer`].
pub fn buffer_symbols(
    path: &Path,
    text: &str,
    rule: &PatternRule,
    scope: ScopeId,
) -> Vec<SymbolMatch> {
    let lines = LineIndex::new(text);
    match_ranges(text, rule)
        .filter_map(|range| SymbolMatch::at(&lines, path, text, range, scope))
        .collect()
}

/// A text range of a buffer paired with the symbol derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch {
    pub range: Range<usize>,
    pub symbol: Symbol,
}

impl SymbolMatch {
    fn at(
        lines: &LineIndex,
        path: &Path,
        text: &str,
        range: Range<usize>,
        scope: ScopeId,
    ) -> Option<Self> {
        let (line, label) = locate(lines, text, range.clone())?;
        Some(SymbolMatch {
            symbol: Symbol::new(path, line, label, scope),
            range,
        })
    }
}

/// Build a [`SymbolMatch`] for `range` of `text`.
///
/// Returns `None` when the range is empty, out of bounds or not on char
/// boundaries.
pub fn symbol_match(
    path: &Path,
    text: &str,
    range: Range<usize>,
    scope: ScopeId,
) -> Option<SymbolMatch> {
    SymbolMatch::at(&LineIndex::new(text), path, text, range, scope)
}

/// Non-empty match ranges, pattern by pattern.
fn match_ranges<'t>(
    text: &'t str,
    rule: &'t PatternRule,
) -> impl Iterator<Item = Range<usize>> + 't {
    rule.symbol_patterns().iter().flat_map(move |pattern| {
        pattern
            .buffer_regex()
            .find_iter(text)
            .filter(|m| !m.as_str().is_empty())
            .map(|m| m.range())
    })
}

/// Line of the range start and the first non-empty line of its text.
fn locate<'t>(lines: &LineIndex, text: &'t str, range: Range<usize>) -> Option<(usize, &'t str)> {
    let matched = text.get(range.clone()).filter(|m| !m.is_empty())?;
    let label = matched
        .split('\n')
        .map(|segment| segment.trim_end_matches('\r'))
        .find(|segment| !segment.is_empty())
        .unwrap_or(matched);
    Some((lines.line_of(range.start), label))
}

/// Byte offsets of line starts, for offset -> 1-based line lookups.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}
