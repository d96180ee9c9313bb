//! Display macro tables.
//!
//! Macros are used in two opposite directions: [`sub_macros`] folds literal
//! values in PV names back into `$(NAME)` tokens for the generated screen,
//! while [`expand_macros`] turns tokens into literal PV names for queries.

use indexmap::IndexMap;
use regex::{NoExpand, Regex};

use crate::error::BuildError;

/// Macro name to literal value, in insertion order.
pub type MacroTable = IndexMap<String, String>;

/// Replace every literal macro value in `text` with its `$(NAME)` token.
///
/// Macros are applied in table order, so earlier entries win when values
/// overlap.
#[must_use]
pub fn sub_macros(text: &str, macros: &MacroTable) -> String {
    let mut text = text.to_string();
    for (name, value) in macros {
        if value.is_empty() {
            continue;
        }
        text = text.replace(value.as_str(), &format!("$({name})"));
    }
    text
}

/// Expand `$(NAME)` and `${NAME}` tokens into their literal values.
#[must_use]
pub fn expand_macros(text: &str, macros: &MacroTable) -> String {
    let mut text = text.to_string();
    for (name, value) in macros {
        let Ok(token) = Regex::new(&format!(r"\$[({{]{}[)}}]", regex::escape(name))) else {
            continue;
        };
        text = token.replace_all(&text, NoExpand(value)).into_owned();
    }
    text
}

/// Parse a `NAME=VALUE,NAME=VALUE` macro string.
pub fn parse_macro_string(text: &str) -> Result<MacroTable, BuildError> {
    let mut macros = MacroTable::new();
    for entry in text.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let Some((name, value)) = entry.split_once('=') else {
            return Err(BuildError::InvalidMacroString(entry.into()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(BuildError::InvalidMacroString(entry.into()));
        }
        macros.insert(name.to_string(), value.to_string());
    }
    Ok(macros)
}
