//! The host's display surface.
//!
//! Query results leave the engine through a [`DisplaySink`]: a transient status
//! line, a jump to `file:line`, or a panel the user picks from.

use crate::types::Symbol;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One row of the result panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PanelItem {
    /// Symbol text only
    Name(String),
    /// Symbol text with the file name underneath, indented like the symbol
    WithFile { name: String, secondary: String },
}

impl PanelItem {
    /// Render one symbol for the panel.
    pub fn from_symbol(symbol: &Symbol, display_filename: bool) -> Self {
        if display_filename {
            PanelItem::WithFile {
                name: symbol.raw_text.clone(),
                secondary: format!("{}{}", symbol.indentation(), symbol.display_name),
            }
        } else {
            PanelItem::Name(symbol.raw_text.clone())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PanelItem::Name(name) => name,
            PanelItem::WithFile { name, .. } => name,
        }
    }
}

/// Render a result list for the panel.
pub fn render(symbols: &[Symbol], display_filename: bool) -> Vec<PanelItem> {
    symbols
        .iter()
        .map(|s| PanelItem::from_symbol(s, display_filename))
        .collect()
}

/// Output side of the host.
pub trait DisplaySink: Send + Sync {
    /// Show a transient status-line message
    fn status(&self, message: &str);

    /// Open `path` with the cursor on `line` (1-based)
    fn jump_to(&self, path: &Path, line: usize);

    /// Show a pick list; returns the chosen index, `None` if dismissed
    fn choose(&self, items: &[PanelItem]) -> Option<usize>;
}

/// Everything a [`RecordingSink`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Status(String),
    JumpTo(PathBuf, usize),
    Panel(Vec<PanelItem>),
}

/// A sink that records what it is shown and picks a fixed panel row.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<DisplayEvent>>,
    pick: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every panel with `index`.
    pub fn picking(index: usize) -> Self {
        RecordingSink {
            events: Mutex::new(Vec::new()),
            pick: Some(index),
        }
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// Status messages only, in order
    pub fn statuses(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Status(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    fn status(&self, message: &str) {
        self.events
            .lock()
            .push(DisplayEvent::Status(message.to_string()));
    }

    fn jump_to(&self, path: &Path, line: usize) {
        self.events
            .lock()
            .push(DisplayEvent::JumpTo(path.to_path_buf(), line));
    }

    fn choose(&self, items: &[PanelItem]) -> Option<usize> {
        self.events.lock().push(DisplayEvent::Panel(items.to_vec()));
        self.pick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScopeId;

    #[test]
    fn test_panel_item_with_filename() {
        let symbol = Symbol::new("/w/pkg/models.py", 12, "    def save(self):", ScopeId::new(1));

        assert_eq!(
            PanelItem::from_symbol(&symbol, true),
            PanelItem::WithFile {
                name: "    def save(self):".to_string(),
                secondary: "    models.py".to_string(),
            }
        );
        assert_eq!(
            PanelItem::from_symbol(&symbol, false),
            PanelItem::Name("    def save(self):".to_string())
        );
    }

    #[test]
    fn test_render_keeps_order() {
        let symbols = vec![
            Symbol::new("/w/b.py", 1, "def b", ScopeId::GLOBAL),
            Symbol::new("/w/a.py", 1, "def a", ScopeId::GLOBAL),
        ];
        let names: Vec<_> = render(&symbols, false)
            .iter()
            .map(|item| item.name().to_string())
            .collect();
        assert_eq!(names, vec!["def b", "def a"]);
    }

    #[test]
    fn test_recording_sink() {
        let sink = RecordingSink::picking(1);
        sink.status("hello");
        assert_eq!(sink.choose(&[PanelItem::Name("x".into())]), Some(1));
        sink.jump_to(Path::new("/w/a.py"), 3);

        assert_eq!(sink.statuses(), vec!["hello"]);
        assert_eq!(sink.events().len(), 3);
        assert_eq!(
            sink.events()[2],
            DisplayEvent::JumpTo(PathBuf::from("/w/a.py"), 3)
        );
    }
}
