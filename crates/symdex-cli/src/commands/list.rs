//! List command - every symbol visible to a workspace.

use super::print_results;
use crate::app::App;
use crate::sink::TerminalSink;
use crate::QueryArgs;
use std::path::PathBuf;

/// Run the list command.
pub fn run(app: &App, folders: Vec<PathBuf>, query: QueryArgs) -> anyhow::Result<()> {
    let scope = query.workspace.scope();
    let sink = TerminalSink::new(query.output.clone(), query.pick, app.quiet);

    app.open_workspace(scope, folders, &sink)?;

    let settings = app.settings()?;
    let symbols = app.service.list_all(&settings, scope, &sink);
    print_results(&symbols, scope, &sink, &query.output, app.quiet)
}
