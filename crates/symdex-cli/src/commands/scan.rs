//! Scan command - rescan one file as an open buffer.

use super::syntax_for;
use crate::app::App;
use crate::OutputFormat;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::time::Instant;
use symdex_core::{MemoryBuffer, RefreshOutcome, ScopeId};

/// Run the scan command.
pub fn run(
    app: &App,
    file: &Path,
    syntax: Option<String>,
    scope: ScopeId,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let file: PathBuf = file
        .canonicalize()
        .with_context(|| format!("cannot open {}", file.display()))?;
    let settings = app.settings()?;
    let syntax = syntax.unwrap_or_else(|| syntax_for(&settings, &file));

    let buffer = MemoryBuffer::open(&file, syntax.as_str())?;

    let start = Instant::now();
    let outcome = app.service.load_view(&settings, scope, &buffer);
    let elapsed = start.elapsed();

    match outcome {
        RefreshOutcome::NoLanguage => {
            bail!("no language configured for {} (syntax {:?})", file.display(), syntax)
        }
        RefreshOutcome::Unsaved => bail!("{} has no path", file.display()),
        RefreshOutcome::Refreshed { .. } => {}
    }

    let symbols = app.service.store().symbols_in_file(&file);
    match output {
        OutputFormat::Text => {
            for symbol in &symbols {
                println!("{:>6}  {}", symbol.line, symbol.raw_text);
            }
            if !app.quiet {
                eprintln!();
                eprintln!(
                    "Found {} symbols in {:.3}ms",
                    symbols.len(),
                    elapsed.as_secs_f64() * 1000.0
                );
            }
        }
        OutputFormat::Json => {
            let doc = serde_json::json!({
                "file": file,
                "syntax": syntax,
                "workspace": scope.as_u64(),
                "symbols": symbols,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}
