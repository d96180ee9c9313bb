//! `opi-builder` - BOY operator screen generation from EPICS PV lists.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Build configuration files.
pub mod config;
/// Title, macros and row layout.
pub mod display;
/// Generation errors.
pub mod error;
/// End-to-end generation pipeline.
pub mod generate;
/// Readback/setpoint pairing.
pub mod grouping;
/// Widget template instantiation.
pub mod instantiate;
/// Record type and description sources.
pub mod lookup;
/// Display macro tables.
pub mod macros;
/// Regex patterns with Python-style replacements.
pub mod pattern;
/// PV list cleanup.
pub mod preprocess;
/// Record classification and PV groups.
pub mod record;
/// Template catalog.
pub mod template;
/// Owned XML tree.
pub mod xml;

pub use config::BuildConfig;
pub use error::{BuildError, ErrorKind};
pub use generate::{classify, generate, Classification, Generated};
pub use lookup::{CagetLookup, PvLookup, TableLookup};
