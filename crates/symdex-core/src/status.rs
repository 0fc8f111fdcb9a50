//! Status-line messages and the loading animation.

use crate::display::DisplaySink;
use crate::indexer::IndexerHandle;
use std::thread;
use std::time::Duration;

/// Shown when a query has no results
pub const EMPTY_SYMBOL: &str = ": Goto symbol - unfound matches";

/// Base text of the animated message shown while folders load
pub const LOADING_FOLDERS: &str = ": Goto symbol - loading folders";

/// How often a host should poll a running indexer
pub const STATUS_INTERVAL: Duration = Duration::from_millis(250);

/// Ellipsis animation: the base text followed by 0, 1, 2, 3 dots, repeating.
#[derive(Debug, Clone)]
pub struct LoadingStatus {
    base: String,
    dots: usize,
}

impl LoadingStatus {
    pub fn new(base: impl Into<String>) -> Self {
        LoadingStatus {
            base: base.into(),
            dots: 0,
        }
    }

    /// The next frame of the animation.
    pub fn next_frame(&mut self) -> String {
        if self.dots > 3 {
            self.dots = 0;
        }
        let frame = format!("{}{}", self.base, ".".repeat(self.dots));
        self.dots += 1;
        frame
    }
}

impl Default for LoadingStatus {
    fn default() -> Self {
        LoadingStatus::new(LOADING_FOLDERS)
    }
}

impl Iterator for LoadingStatus {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_frame())
    }
}

/// Show the loading animation on `sink` until `handle` reports done.
///
/// Polls the handle's flag every `interval`; it never joins the indexer
/// thread. Returns the number of frames shown. Hosts with their own timer can
/// drive [`LoadingStatus`] directly instead.
pub fn watch_indexer(handle: &IndexerHandle, sink: &dyn DisplaySink, interval: Duration) -> usize {
    let mut status = LoadingStatus::default();
    let mut frames = 0;
    while !handle.is_done() {
        sink.status(&status.next_frame());
        frames += 1;
        thread::sleep(interval);
    }
    frames
}
