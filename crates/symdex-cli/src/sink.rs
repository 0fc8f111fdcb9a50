//! Terminal display sink.
//!
//! Status messages go to stderr on a single rewritten line; panels and jump
//! targets go to stdout. In JSON mode nothing is printed to stdout here: the
//! command prints one document at the end, using [`TerminalSink::jumped`].

use crate::OutputFormat;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use symdex_core::{DisplaySink, PanelItem};

pub struct TerminalSink {
    output: OutputFormat,
    /// 1-based panel row to choose
    pick: Option<usize>,
    quiet: bool,
    /// Width of the status line currently on screen, 0 if none
    status_width: AtomicUsize,
    jumped: Mutex<Option<(PathBuf, usize)>>,
}

impl TerminalSink {
    pub fn new(output: OutputFormat, pick: Option<usize>, quiet: bool) -> Self {
        TerminalSink {
            output,
            pick,
            quiet,
            status_width: AtomicUsize::new(0),
            jumped: Mutex::new(None),
        }
    }

    /// Where the last jump went.
    pub fn jumped(&self) -> Option<(PathBuf, usize)> {
        self.jumped.lock().clone()
    }

    /// Erase the status line.
    pub fn clear_status(&self) {
        let width = self.status_width.swap(0, Ordering::Relaxed);
        if width > 0 {
            eprint!("\r{}\r", " ".repeat(width));
            let _ = std::io::stderr().flush();
        }
    }

    /// Leave the status line on screen and move past it.
    pub fn finish(&self) {
        if self.status_width.swap(0, Ordering::Relaxed) > 0 {
            eprintln!();
        }
    }

    fn pick_index(&self, rows: usize) -> Option<usize> {
        self.pick
            .and_then(|p| p.checked_sub(1))
            .filter(|&index| index < rows)
    }
}

impl DisplaySink for TerminalSink {
    fn status(&self, message: &str) {
        if self.quiet {
            return;
        }
        let previous = self.status_width.swap(message.len(), Ordering::Relaxed);
        let padding = previous.saturating_sub(message.len());
        eprint!("\r{}{}", message, " ".repeat(padding));
        let _ = std::io::stderr().flush();
    }

    fn jump_to(&self, path: &Path, line: usize) {
        *self.jumped.lock() = Some((path.to_path_buf(), line));
        if let OutputFormat::Text = self.output {
            println!("{}:{}", path.display(), line);
        }
    }

    fn choose(&self, items: &[PanelItem]) -> Option<usize> {
        if let OutputFormat::Text = self.output {
            // picking a row prints only the jump target
            if self.pick.is_none() {
                for (row, item) in items.iter().enumerate() {
                    match item {
                        PanelItem::Name(name) => println!("{:>4}  {}", row + 1, name),
                        PanelItem::WithFile { name, secondary } => {
                            println!("{:>4}  {}", row + 1, name);
                            println!("      {}", secondary);
                        }
                    }
                }
            }
        }
        self.pick_index(items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<PanelItem> {
        (0..n).map(|i| PanelItem::Name(format!("def f{}", i))).collect()
    }

    #[test]
    fn test_pick_is_one_based() {
        let sink = TerminalSink::new(OutputFormat::Json, Some(2), true);
        assert_eq!(sink.choose(&items(3)), Some(1));
    }

    #[test]
    fn test_pick_out_of_range_dismisses() {
        let sink = TerminalSink::new(OutputFormat::Json, Some(4), true);
        assert_eq!(sink.choose(&items(3)), None);

        let sink = TerminalSink::new(OutputFormat::Json, Some(0), true);
        assert_eq!(sink.choose(&items(3)), None);
    }

    #[test]
    fn test_no_pick_dismisses() {
        let sink = TerminalSink::new(OutputFormat::Json, None, true);
        assert_eq!(sink.choose(&items(3)), None);
    }

    #[test]
    fn test_jump_is_recorded() {
        let sink = TerminalSink::new(OutputFormat::Json, None, true);
        assert!(sink.jumped().is_none());
        sink.jump_to(Path::new("/w/a.py"), 12);
        assert_eq!(sink.jumped(), Some((PathBuf::from("/w/a.py"), 12)));
    }

    #[test]
    fn test_quiet_status_leaves_no_line() {
        let sink = TerminalSink::new(OutputFormat::Text, None, true);
        sink.status("loading");
        assert_eq!(sink.status_width.load(Ordering::Relaxed), 0);
    }
}
