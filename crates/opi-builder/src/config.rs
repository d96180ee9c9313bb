//! Build configuration loading.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::BuildError;
use crate::instantiate::{Cursor, LayoutOptions};
use crate::macros::MacroTable;

pub const DEFAULT_TEMPLATE: &str = "template.opi";
pub const DEFAULT_TITLE: &str = "title";

/// Regex pattern with its replacement.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatternPair {
    pub pattern: String,
    pub replacement: String,
}

impl PatternPair {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Everything a generation run needs besides its inputs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub template: PathBuf,
    pub title: String,
    pub macros: MacroTable,
    pub ignore: Vec<String>,
    pub sort: String,
    pub substitute: Option<PatternPair>,
    pub group: Option<PatternPair>,
    pub layout: LayoutOptions,
    pub origin: Cursor,
    /// Record types given up front, keyed by processed PV name.
    pub record_types: IndexMap<String, String>,
    /// Descriptions given up front, keyed by processed PV name.
    pub descriptions: IndexMap<String, String>,
    pub pv_table: Option<PathBuf>,
    pub record_type_timeout: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from(DEFAULT_TEMPLATE),
            title: DEFAULT_TITLE.to_string(),
            macros: MacroTable::new(),
            ignore: Vec::new(),
            sort: String::new(),
            substitute: None,
            group: None,
            layout: LayoutOptions::default(),
            origin: Cursor::default(),
            record_types: IndexMap::new(),
            descriptions: IndexMap::new(),
            pv_table: None,
            record_type_timeout: Duration::from_secs(1),
        }
    }
}

impl BuildConfig {
    /// Load a TOML config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| BuildError::InvalidConfig(format!("{}: {err}", path.display()).into()))?;
        let mut config = Self::parse(&text)
            .map_err(|err| BuildError::InvalidConfig(format!("{}: {err}", path.display()).into()))?;
        if let Some(base) = path.parent() {
            config.template = rebase(base, &config.template);
            config.pv_table = config.pv_table.map(|table| rebase(base, &table));
        }
        Ok(config)
    }

    /// Parse TOML text without touching the filesystem.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let raw: BuildToml = toml::from_str(text)?;
        Ok(raw.into_config())
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BuildToml {
    template: Option<PathBuf>,
    title: Option<String>,
    macros: MacroTable,
    ignore: Vec<String>,
    sort: Option<String>,
    substitute: Option<PatternPair>,
    group: Option<PatternPair>,
    layout: LayoutSection,
    lookup: LookupSection,
    record_types: IndexMap<String, String>,
    descriptions: IndexMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LayoutSection {
    #[serde(flatten)]
    options: LayoutOptions,
    origin: Option<[f64; 2]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LookupSection {
    pv_table: Option<PathBuf>,
    record_type_timeout_ms: Option<u64>,
}

impl BuildToml {
    fn into_config(self) -> BuildConfig {
        let defaults = BuildConfig::default();
        let origin = self
            .layout
            .origin
            .map_or(defaults.origin, |[x, y]| Cursor::new(x, y));
        BuildConfig {
            template: self.template.unwrap_or(defaults.template),
            title: self.title.unwrap_or(defaults.title),
            macros: self.macros,
            ignore: self.ignore,
            sort: self.sort.unwrap_or_default(),
            substitute: self.substitute,
            group: self.group,
            layout: self.layout.options,
            origin,
            record_types: self.record_types,
            descriptions: self.descriptions,
            pv_table: self.lookup.pv_table,
            record_type_timeout: self
                .lookup
                .record_type_timeout_ms
                .map_or(defaults.record_type_timeout, Duration::from_millis),
        }
    }
}
