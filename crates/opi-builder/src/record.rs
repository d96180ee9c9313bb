//! Record type classification and PV group resolution.

#![allow(missing_docs)]

use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::BuildError;
use crate::lookup::PvLookup;
use crate::macros::{expand_macros, MacroTable};

/// Timeout for best-effort description queries.
pub const DESCRIPTION_TIMEOUT: Duration = Duration::from_millis(100);

/// Widget family a record type is displayed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Text,
    Binary,
    Menu,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Menu => "menu",
        }
    }
}

/// Data direction of a single PV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    #[serde(rename = "r")]
    Read,
    #[serde(rename = "w")]
    Write,
}

/// Combined access of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Ro,
    Wo,
    Rw,
}

impl Access {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ro => "ro",
            Self::Wo => "wo",
            Self::Rw => "rw",
        }
    }
}

/// Category and direction of a known record type.
pub fn classify_record_type(record_type: &str) -> Result<(Category, Direction), BuildError> {
    let info = match record_type {
        "ai" | "longin" | "stringin" | "calc" | "calcout" => (Category::Text, Direction::Read),
        "ao" | "longout" | "stringout" => (Category::Text, Direction::Write),
        "bi" => (Category::Binary, Direction::Read),
        "bo" => (Category::Binary, Direction::Write),
        "mbbi" => (Category::Menu, Direction::Read),
        "mbbo" => (Category::Menu, Direction::Write),
        other => return Err(BuildError::UnknownRecordType(other.into())),
    };
    Ok(info)
}

/// Template name for a category/access combination.
#[must_use]
pub fn template_name(category: Category, access: Access) -> String {
    format!("{}_{}_group", category.as_str(), access.as_str())
}

/// One screen row: a readback, a setpoint, or both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PvGroup {
    pub readback_pv: String,
    pub setpoint_pv: String,
    pub desc_pv: String,
    pub description: String,
    pub access: Access,
    pub category: Category,
    pub record_types: Vec<String>,
    pub template_name: String,
}

impl PvGroup {
    /// Placeholder fields of this group.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("readback_pv", self.readback_pv.clone()),
            ("setpoint_pv", self.setpoint_pv.clone()),
            ("desc_pv", self.desc_pv.clone()),
            ("desc", self.description.clone()),
            ("description", self.description.clone()),
            ("template", self.template_name.clone()),
            ("template_name", self.template_name.clone()),
            ("access", self.access.as_str().to_string()),
            ("category", self.category.as_str().to_string()),
        ]
    }

    /// Value of a named field, if the group has one.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "readback_pv" => self.readback_pv.as_str(),
            "setpoint_pv" => self.setpoint_pv.as_str(),
            "desc_pv" => self.desc_pv.as_str(),
            "desc" | "description" => self.description.as_str(),
            "template" | "template_name" => self.template_name.as_str(),
            "access" => self.access.as_str(),
            "category" => self.category.as_str(),
            _ => return None,
        };
        Some(value)
    }
}

/// Classify one or two PVs into a [`PvGroup`].
///
/// Record types come from `explicit_record_types` when given, otherwise from
/// `lookup` on the macro-expanded names. The description is `explicit_description`
/// when given, a best-effort lookup when macros are set, and the raw readback
/// name otherwise.
pub fn resolve(
    macros: &MacroTable,
    pvs: &[&str],
    explicit_record_types: Option<&[&str]>,
    explicit_description: Option<&str>,
    lookup: &dyn PvLookup,
) -> Result<PvGroup, BuildError> {
    let record_types = match explicit_record_types {
        Some(types) => {
            if types.len() != pvs.len() {
                return Err(BuildError::RecordTypeCount {
                    expected: pvs.len(),
                    got: types.len(),
                });
            }
            types.iter().map(|rt| (*rt).to_string()).collect::<Vec<_>>()
        }
        None => {
            if macros.is_empty() {
                return Err(BuildError::MacrosRequired);
            }
            pvs.iter()
                .map(|pv| {
                    let expanded = expand_macros(pv, macros);
                    lookup
                        .record_type(&expanded)
                        .map_err(|failure| BuildError::Lookup {
                            pv: expanded.as_str().into(),
                            reason: failure.0,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let classes = record_types
        .iter()
        .map(|rt| classify_record_type(rt))
        .collect::<Result<Vec<_>, _>>()?;

    if let [(_, first), (_, second)] = classes.as_slice() {
        if first == second {
            let what = match first {
                Direction::Read => "readbacks",
                Direction::Write => "setpoints",
            };
            return Err(BuildError::InvalidPairing(what, pvs.join(", ").into()));
        }
    }

    let mut readback = None;
    let mut setpoint = None;
    for (pv, (_, direction)) in pvs.iter().zip(&classes) {
        match direction {
            Direction::Read => readback = Some(*pv),
            Direction::Write => setpoint = Some(*pv),
        }
    }

    // Mixed-category pairs take the category of the last PV, usually the
    // transformed partner.
    let Some(&(category, _)) = classes.last() else {
        return Err(BuildError::NoPv);
    };
    let (desc_pv, access) = match (readback, setpoint) {
        (Some(rb), Some(_)) => (rb, Access::Rw),
        (Some(rb), None) => (rb, Access::Ro),
        (None, Some(sp)) => (sp, Access::Wo),
        (None, None) => return Err(BuildError::NoPv),
    };
    let readback_pv = readback.map(str::to_string).unwrap_or_default();
    let setpoint_pv = setpoint.map(str::to_string).unwrap_or_default();

    let description = match explicit_description {
        Some(description) => description.to_string(),
        None if !macros.is_empty() => lookup
            .description(&expand_macros(desc_pv, macros), DESCRIPTION_TIMEOUT)
            .unwrap_or_default(),
        None => readback_pv.clone(),
    };

    let template_name = template_name(category, access);
    info!(
        "Readback: {readback_pv} setpoint: {setpoint_pv} record type: {record_types:?} description: {description} template: {template_name}"
    );
    Ok(PvGroup {
        readback_pv,
        setpoint_pv,
        desc_pv: desc_pv.to_string(),
        description,
        access,
        category,
        record_types,
        template_name,
    })
}
