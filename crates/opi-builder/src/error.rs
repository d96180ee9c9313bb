//! Screen generation errors.

#![allow(missing_docs)]

use smol_str::SmolStr;
use thiserror::Error;

/// Coarse error classes reported to the caller of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed template document.
    Parse,
    /// Missing or invalid configuration/template data.
    Config,
    /// A PV group could not be classified.
    Classification,
    /// An external PV query failed.
    Lookup,
    /// A template placeholder has no value.
    Placeholder,
}

/// Errors raised while building a screen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Template source is not well-formed XML.
    #[error("failed to parse template: {0}")]
    TemplateParse(SmolStr),

    /// A widget is missing a required child field.
    #[error("widget '{widget}' is missing required field '{field}'")]
    MissingField { widget: SmolStr, field: SmolStr },

    /// A widget field holds a value of the wrong shape.
    #[error("widget '{widget}' has invalid {field} '{value}'")]
    InvalidField {
        widget: SmolStr,
        field: SmolStr,
        value: SmolStr,
    },

    /// Record types must be queried but no macros were provided.
    #[error("macros must be set to determine record types")]
    MacrosRequired,

    /// Explicit record types do not line up with the PVs of a group.
    #[error("expected {expected} record type(s), got {got}")]
    RecordTypeCount { expected: usize, got: usize },

    /// Record type without a category/direction mapping.
    #[error("unknown record type '{0}'")]
    UnknownRecordType(SmolStr),

    /// Both PVs of a pair resolved to the same direction.
    #[error("two {0} in one group ({1})")]
    InvalidPairing(&'static str, SmolStr),

    /// Group without any readback or setpoint PV.
    #[error("group needs either a readback or a setpoint PV")]
    NoPv,

    /// External record type query failed.
    #[error("record type lookup failed for '{pv}': {reason}")]
    Lookup { pv: SmolStr, reason: SmolStr },

    /// Template placeholder without a matching field.
    #[error("template '{template}' has no value for placeholder '%({key})s'")]
    MissingPlaceholder { template: SmolStr, key: SmolStr },

    /// Regular expression failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: SmolStr, reason: SmolStr },

    /// Configuration file error.
    #[error("invalid config '{0}'")]
    InvalidConfig(SmolStr),

    /// Macro string entry is not of the form NAME=VALUE.
    #[error("invalid macro entry '{0}' (expected NAME=VALUE)")]
    InvalidMacroString(SmolStr),
}

impl BuildError {
    /// Error class for reporting.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TemplateParse(_) => ErrorKind::Parse,
            Self::MissingField { .. }
            | Self::InvalidField { .. }
            | Self::MacrosRequired
            | Self::RecordTypeCount { .. }
            | Self::InvalidPattern { .. }
            | Self::InvalidConfig(_)
            | Self::InvalidMacroString(_) => ErrorKind::Config,
            Self::UnknownRecordType(_) | Self::InvalidPairing(..) | Self::NoPv => {
                ErrorKind::Classification
            }
            Self::Lookup { .. } => ErrorKind::Lookup,
            Self::MissingPlaceholder { .. } => ErrorKind::Placeholder,
        }
    }
}

impl From<roxmltree::Error> for BuildError {
    fn from(value: roxmltree::Error) -> Self {
        Self::TemplateParse(value.to_string().into())
    }
}
