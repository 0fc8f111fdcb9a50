//! Application state management.

use crate::sink::TerminalSink;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symdex_core::indexer::LoggingProgress;
use symdex_core::status::{watch_indexer, STATUS_INTERVAL};
use symdex_core::{IndexerReport, ScopeId, Settings, SymbolService, Workspace};
use tracing::info;

/// Shared application state.
pub struct App {
    /// Settings file, if one was given explicitly
    pub config_path: Option<PathBuf>,

    /// The symbol service for this process
    pub service: SymbolService,

    /// Suppress the status animation
    pub quiet: bool,
}

impl App {
    /// Create a new application instance.
    pub fn new(config_path: Option<&Path>, quiet: bool) -> anyhow::Result<Self> {
        let service =
            SymbolService::new().with_progress(Arc::new(LoggingProgress::new(ScopeId::GLOBAL)));

        let app = App {
            config_path: config_path.map(Path::to_path_buf),
            service,
            quiet,
        };
        // fail early on a broken settings file
        app.settings()?;
        Ok(app)
    }

    /// Read the settings afresh; every operation gets its own snapshot.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings = match &self.config_path {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        Ok(settings)
    }

    /// Open a workspace on `folders` and wait for its background index,
    /// animating the status line meanwhile.
    pub fn open_workspace(
        &self,
        scope: ScopeId,
        folders: Vec<PathBuf>,
        sink: &TerminalSink,
    ) -> anyhow::Result<Option<IndexerReport>> {
        let folders = folders
            .into_iter()
            .map(|f| {
                f.canonicalize()
                    .with_context(|| format!("cannot open folder {}", f.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let workspace = Workspace::new(scope, folders);
        let settings = self.settings()?;
        let Some(handle) = self.service.load_folders(&settings, &workspace) else {
            return Ok(None);
        };

        if !self.quiet {
            watch_indexer(&handle, sink, STATUS_INTERVAL);
            sink.clear_status();
        }
        let report = handle.join();

        info!(
            files = report.files_scanned,
            symbols = report.symbols_found,
            elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
            "Workspace loaded"
        );
        Ok(Some(report))
    }
}
