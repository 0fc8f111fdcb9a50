//! Config command - show where settings come from and what they resolve to.

use crate::app::App;
use symdex_core::{Settings, WorkspaceConfig};

/// Run the config command.
pub fn run(app: &App) -> anyhow::Result<()> {
    let path = match &app.config_path {
        Some(path) => path.clone(),
        None => Settings::default_config_path()?,
    };
    let settings = app.settings()?;
    let config = WorkspaceConfig::resolve(&settings);

    println!("Symdex Settings");
    println!("===============");
    println!();
    println!(
        "Settings file:    {}{}",
        path.display(),
        if path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!("Display filename: {}", config.display_filename);
    println!("Load folders:     {}", config.load_folders);

    println!();
    println!("Folder exclusions:");
    for pattern in &config.exclude_patterns {
        println!("  {}", pattern);
    }

    println!();
    println!("Languages:");
    for (name, rule) in &config.langs {
        println!("  {}", name);
        println!("    files:   {}", rule.file_patterns().join(", "));
        for pattern in rule.symbol_patterns() {
            println!("    symbol:  {}", pattern.as_str());
        }
    }

    Ok(())
}
