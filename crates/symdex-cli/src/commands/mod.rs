//! CLI command implementations.

pub mod config;
pub mod find;
pub mod list;
pub mod scan;

use crate::sink::TerminalSink;
use crate::OutputFormat;
use std::path::Path;
use symdex_core::{ScopeId, Settings, Symbol, WorkspaceConfig};

/// Syntax identifier for a file on disk: the id of the first language whose
/// file patterns match it, or an empty string.
pub(crate) fn syntax_for(settings: &Settings, path: &Path) -> String {
    WorkspaceConfig::resolve(settings)
        .language_for_path(path)
        .map(|rule| rule.language().to_string())
        .unwrap_or_default()
}

/// Print the outcome of a list or find query.
pub(crate) fn print_results(
    symbols: &[Symbol],
    scope: ScopeId,
    sink: &TerminalSink,
    output: &OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => {
            sink.finish();
            if !quiet {
                eprintln!("{} symbols visible to workspace {}", symbols.len(), scope);
            }
        }
        OutputFormat::Json => {
            sink.finish();
            let jump = sink
                .jumped()
                .map(|(path, line)| serde_json::json!({ "path": path, "line": line }));
            let doc = serde_json::json!({
                "workspace": scope.as_u64(),
                "count": symbols.len(),
                "symbols": symbols,
                "jump": jump,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}
