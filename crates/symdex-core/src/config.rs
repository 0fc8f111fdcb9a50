//! Configuration management for Symdex.
//!
//! Two layers live here:
//!
//! - [`Settings`] mirrors the TOML settings file a host hands us. Every field
//!   has a serde default, so a missing key is a typed default rather than a
//!   lookup miss.
//! - [`WorkspaceConfig`] is the resolved snapshot used by one operation:
//!   exclusion patterns merged, symbol patterns compiled. Hosts resolve a fresh
//!   one at the start of every folder load and every view load.

use crate::error::{Result, SymdexError};
use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings file contents.
///
/// ## Example Settings File (symdex.toml)
///
/// ```toml
/// # host-wide exclusions, shared with other tools
/// folder_exclude_patterns = ["\\.git$"]
///
/// [goto_symbol]
/// display_filename = true
/// load_folders = true
/// folder_exclude_patterns = ["target$", "node_modules$"]
///
/// [goto_symbol.langs.Python]
/// file_patterns = ["py"]
/// symbol_patterns = ["def \\w+", "class \\w+"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host-global directory exclusion regexes
    pub folder_exclude_patterns: Vec<String>,

    /// Symbol indexer settings
    pub goto_symbol: GotoSymbolSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            folder_exclude_patterns: vec![
                r"\.git$".to_string(),
                r"\.hg$".to_string(),
                r"\.svn$".to_string(),
            ],
            goto_symbol: GotoSymbolSettings::default(),
        }
    }
}

/// The `[goto_symbol]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GotoSymbolSettings {
    /// Show the file name under each symbol in the result panel
    pub display_filename: bool,

    /// Index the workspace folders in the background on first file open
    pub load_folders: bool,

    /// Workspace-local directory exclusion regexes
    pub folder_exclude_patterns: Vec<String>,

    /// Language id -> extraction rule
    pub langs: BTreeMap<String, LangSettings>,
}

impl Default for GotoSymbolSettings {
    fn default() -> Self {
        GotoSymbolSettings {
            display_filename: true,
            load_folders: true,
            folder_exclude_patterns: Vec::new(),
            langs: builtin_langs(),
        }
    }
}

/// One `[goto_symbol.langs.<id>]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LangSettings {
    /// File extensions handled by this language ("py", ".py" and "*.py" are equivalent)
    pub file_patterns: Vec<String>,

    /// Regexes recognizing a symbol, tried in order
    pub symbol_patterns: Vec<String>,
}

impl LangSettings {
    pub fn new<S: Into<String>>(
        file_patterns: impl IntoIterator<Item = S>,
        symbol_patterns: impl IntoIterator<Item = S>,
    ) -> Self {
        LangSettings {
            file_patterns: file_patterns.into_iter().map(Into::into).collect(),
            symbol_patterns: symbol_patterns.into_iter().map(Into::into).collect(),
        }
    }
}

fn builtin_langs() -> BTreeMap<String, LangSettings> {
    let mut langs = BTreeMap::new();
    langs.insert(
        "Python".to_string(),
        LangSettings::new(["py"], [r"\s*def \w+", r"\s*class \w+"]),
    );
    langs.insert(
        "Rust".to_string(),
        LangSettings::new(
            ["rs"],
            [
                r"\s*(pub(\([^)]*\))? )?(async )?fn \w+",
                r"\s*(pub(\([^)]*\))? )?(struct|enum|trait|mod) \w+",
            ],
        ),
    );
    langs
}

impl Settings {
    /// Load settings from the default location.
    ///
    /// Returns default settings if no settings file exists.
    pub fn load() -> Result<Self> {
        let path = Self::default_config_path()?;
        Self::load_from(&path)
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Settings::default());
        }

        info!(path = %path.display(), "Loading settings");
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| SymdexError::Config {
            reason: format!("Failed to parse settings: {}", e),
        })
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving settings");
        let contents = toml::to_string_pretty(self).map_err(|e| SymdexError::Config {
            reason: format!("Failed to serialize settings: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default settings file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "symdex").ok_or_else(|| SymdexError::Config {
            reason: "Could not determine config directory".to_string(),
        })?;

        Ok(dirs.config_dir().join("symdex.toml"))
    }
}

/// A compiled symbol pattern.
///
/// Files on disk are scanned one line at a time with the pattern anchored at
/// the line start. Live buffers are searched as a whole, case-insensitively,
/// with `^`/`$` matching at line boundaries.
#[derive(Debug, Clone)]
pub struct SymbolPattern {
    source: String,
    line: Regex,
    buffer: Regex,
}

impl SymbolPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let line = Regex::new(&format!("^(?:{})", pattern))
            .map_err(|e| SymdexError::invalid_pattern(pattern, &e))?;
        let buffer = Regex::new(&format!("(?im){}", pattern))
            .map_err(|e| SymdexError::invalid_pattern(pattern, &e))?;
        Ok(SymbolPattern {
            source: pattern.to_string(),
            line,
            buffer,
        })
    }

    /// The pattern as written in the settings
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match anchored at the start of `line`
    pub fn match_line<'t>(&self, line: &'t str) -> Option<&'t str> {
        self.line.find(line).map(|m| m.as_str())
    }

    /// Regex used for whole-buffer searches
    pub fn buffer_regex(&self) -> &Regex {
        &self.buffer
    }
}

/// File patterns and ordered symbol patterns for one language.
#[derive(Debug, Clone)]
pub struct PatternRule {
    language: String,
    file_patterns: Vec<String>,
    symbol_patterns: Vec<SymbolPattern>,
}

impl PatternRule {
    /// Compile a rule, failing on the first invalid symbol pattern.
    pub fn new<S: AsRef<str>>(
        language: impl Into<String>,
        file_patterns: &[S],
        symbol_patterns: &[S],
    ) -> Result<Self> {
        let symbol_patterns = symbol_patterns
            .iter()
            .map(|p| SymbolPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(PatternRule {
            language: language.into(),
            file_patterns: normalize_extensions(file_patterns),
            symbol_patterns,
        })
    }

    /// Compile a rule from settings, dropping patterns that do not compile.
    pub fn from_settings(language: &str, settings: &LangSettings) -> Self {
        let symbol_patterns = settings
            .symbol_patterns
            .iter()
            .filter_map(|p| match SymbolPattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(language = %language, error = %e, "Dropping symbol pattern");
                    None
                }
            })
            .collect();

        PatternRule {
            language: language.to_string(),
            file_patterns: normalize_extensions(&settings.file_patterns),
            symbol_patterns,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Normalized extensions, without leading `*` or `.`
    pub fn file_patterns(&self) -> &[String] {
        &self.file_patterns
    }

    pub fn symbol_patterns(&self) -> &[SymbolPattern] {
        &self.symbol_patterns
    }

    /// Check whether a file belongs to this language by its extension.
    pub fn matches_path(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.file_patterns
            .iter()
            .any(|p| p.eq_ignore_ascii_case(ext))
    }
}

fn normalize_extensions<S: AsRef<str>>(patterns: &[S]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.as_ref().trim_start_matches('*').trim_start_matches('.'))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-operation configuration snapshot.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Show the file name under each symbol in the result panel
    pub display_filename: bool,

    /// Index folder trees in the background
    pub load_folders: bool,

    /// Host-global and workspace-local exclusion regexes, merged
    pub exclude_patterns: Vec<String>,

    /// Language id -> compiled rule
    pub langs: BTreeMap<String, PatternRule>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            display_filename: true,
            load_folders: true,
            exclude_patterns: Vec::new(),
            langs: BTreeMap::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Resolve the settings into a snapshot.
    ///
    /// Host-global exclusions come first, then workspace-local ones; exact
    /// duplicates are kept once.
    pub fn resolve(settings: &Settings) -> Self {
        let mut exclude_patterns: Vec<String> = Vec::new();
        for pattern in settings
            .folder_exclude_patterns
            .iter()
            .chain(&settings.goto_symbol.folder_exclude_patterns)
        {
            if !exclude_patterns.contains(pattern) {
                exclude_patterns.push(pattern.clone());
            }
        }

        let langs = settings
            .goto_symbol
            .langs
            .iter()
            .map(|(id, lang)| (id.clone(), PatternRule::from_settings(id, lang)))
            .collect::<BTreeMap<_, _>>();

        debug!(
            languages = langs.len(),
            exclusions = exclude_patterns.len(),
            "Resolved workspace config"
        );

        WorkspaceConfig {
            display_filename: settings.goto_symbol.display_filename,
            load_folders: settings.goto_symbol.load_folders,
            exclude_patterns,
            langs,
        }
    }

    /// Add a compiled rule, replacing any rule with the same language id.
    pub fn with_rule(mut self, rule: PatternRule) -> Self {
        self.langs.insert(rule.language().to_string(), rule);
        self
    }

    /// Add exclusion patterns.
    pub fn with_exclusions<S: Into<String>>(
        mut self,
        patterns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Rule for a file, chosen by extension. Languages are tried in id order.
    pub fn language_for_path(&self, path: &Path) -> Option<&PatternRule> {
        self.langs.values().find(|rule| rule.matches_path(path))
    }

    /// Rule for a buffer, chosen by its syntax identifier.
    ///
    /// `Packages/Python/Python.tmLanguage` resolves to `Python`; a bare id is
    /// looked up as-is.
    pub fn language_for_syntax(&self, syntax: &str) -> Option<&PatternRule> {
        let mut parts = syntax.split('/');
        let id = match (parts.next(), parts.next()) {
            (Some(_), Some(second)) => second,
            _ => syntax,
        };
        self.langs.get(id)
    }
}
