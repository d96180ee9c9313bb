//! External PV queries (record type and description).

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::debug;

/// Why a record type query produced no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure(pub SmolStr);

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of PV metadata. Names passed in are macro-expanded.
pub trait PvLookup {
    /// Record type of `pv` (e.g. `ai`). Failures abort the run.
    fn record_type(&self, pv: &str) -> Result<String, LookupFailure>;

    /// Best-effort description of `pv`; `None` when unavailable.
    fn description(&self, pv: &str, timeout: Duration) -> Option<String>;
}

/// Offline lookup backed by in-memory tables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableLookup {
    /// PV name to record type.
    #[serde(default)]
    pub record_types: IndexMap<String, String>,
    /// PV name to description.
    #[serde(default)]
    pub descriptions: IndexMap<String, String>,
}

impl TableLookup {
    /// Parse a TOML document with `[record_types]` and `[descriptions]`.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a PV table file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("failed to read PV table '{}': {err}", path.display()))?;
        Self::from_toml(&text)
            .map_err(|err| anyhow::anyhow!("invalid PV table '{}': {err}", path.display()))
    }

    /// Add a record type entry.
    #[must_use]
    pub fn with_record_type(mut self, pv: &str, record_type: &str) -> Self {
        self.record_types
            .insert(pv.to_string(), record_type.to_string());
        self
    }

    /// Add a description entry.
    #[must_use]
    pub fn with_description(mut self, pv: &str, description: &str) -> Self {
        self.descriptions
            .insert(pv.to_string(), description.to_string());
        self
    }
}

impl PvLookup for TableLookup {
    fn record_type(&self, pv: &str) -> Result<String, LookupFailure> {
        self.record_types
            .get(pv)
            .cloned()
            .ok_or_else(|| LookupFailure("not in PV table".into()))
    }

    fn description(&self, pv: &str, _timeout: Duration) -> Option<String> {
        self.descriptions.get(pv).cloned()
    }
}

/// Lookup through the EPICS `caget` command-line client.
#[derive(Debug, Clone)]
pub struct CagetLookup {
    program: String,
    record_type_timeout: Duration,
}

impl Default for CagetLookup {
    fn default() -> Self {
        Self {
            program: "caget".to_string(),
            record_type_timeout: Duration::from_secs(1),
        }
    }
}

impl CagetLookup {
    /// `caget` with the given record type timeout.
    #[must_use]
    pub fn new(record_type_timeout: Duration) -> Self {
        Self {
            record_type_timeout,
            ..Self::default()
        }
    }

    /// Use a different client executable.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn caget(&self, channel: &str, timeout: Duration) -> Result<String, LookupFailure> {
        debug!(channel, timeout_s = timeout.as_secs_f64(), "caget");
        let output = Command::new(&self.program)
            .arg("-t")
            .arg("-w")
            .arg(format!("{}", timeout.as_secs_f64()))
            .arg(channel)
            .output()
            .map_err(|err| LookupFailure(format!("{} unavailable: {err}", self.program).into()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let reason = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(LookupFailure(reason.into()));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(LookupFailure("empty response".into()));
        }
        Ok(text)
    }
}

impl PvLookup for CagetLookup {
    fn record_type(&self, pv: &str) -> Result<String, LookupFailure> {
        self.caget(&format!("{pv}.RTYP"), self.record_type_timeout)
    }

    fn description(&self, pv: &str, timeout: Duration) -> Option<String> {
        self.caget(&format!("{pv}.DESC"), timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_reads_toml() {
        let lookup = TableLookup::from_toml(
            r#"
[record_types]
"ANC300:AX1:PV_IN" = "ai"

[descriptions]
"ANC300:AX1:PV_IN" = "Position"
"#,
        )
        .expect("parse table");
        assert_eq!(
            lookup.record_type("ANC300:AX1:PV_IN").as_deref(),
            Ok("ai")
        );
        assert_eq!(
            lookup.description("ANC300:AX1:PV_IN", Duration::from_millis(100)),
            Some("Position".to_string())
        );
        assert!(lookup.record_type("ANC300:AX1:MISSING").is_err());
    }

    #[test]
    fn caget_reports_missing_client() {
        let lookup = CagetLookup::default().with_program("opi-builder-no-such-caget");
        let err = lookup.record_type("X:Y").expect_err("missing client");
        assert!(err.0.contains("unavailable"));
        assert_eq!(lookup.description("X:Y", Duration::from_millis(100)), None);
    }
}
