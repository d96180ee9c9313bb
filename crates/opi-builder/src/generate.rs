//! End-to-end screen generation.

use serde::Serialize;
use tracing::info;

use crate::config::BuildConfig;
use crate::display::assemble;
use crate::error::BuildError;
use crate::grouping::{group, Grouping};
use crate::lookup::PvLookup;
use crate::pattern::Substitution;
use crate::preprocess::{compile_ignore, preprocess};
use crate::record::{resolve, PvGroup};
use crate::template::TemplateCatalog;

/// Grouping and classification of a PV list.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    /// Pairs and unpaired PVs after preprocessing.
    pub grouping: Grouping,
    /// Resolved groups, singles first.
    pub groups: Vec<PvGroup>,
}

/// A generated screen and the groups placed on it.
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    /// Serialized screen, XML declaration included.
    #[serde(skip)]
    pub xml: String,
    /// Pairs and unpaired PVs after preprocessing.
    pub grouping: Grouping,
    /// Groups in placement order.
    pub groups: Vec<PvGroup>,
    /// Cursor height after the last row.
    pub final_y: f64,
}

/// Preprocess, pair and resolve `raw_lines`.
///
/// Singles are resolved before pairs. The first failing group aborts the run.
pub fn classify<S: AsRef<str>>(
    config: &BuildConfig,
    raw_lines: &[S],
    lookup: &dyn PvLookup,
) -> Result<Classification, BuildError> {
    let substitute = config
        .substitute
        .as_ref()
        .map(|pair| Substitution::new(&pair.pattern, &pair.replacement))
        .transpose()?;
    let pairing = config
        .group
        .as_ref()
        .map(|pair| Substitution::new(&pair.pattern, &pair.replacement))
        .transpose()?;
    let ignore = compile_ignore(&config.ignore)?;

    let pvs = preprocess(raw_lines, substitute.as_ref(), &config.macros, &ignore);
    info!(count = pvs.len(), "PVs after preprocessing");
    let grouping = group(&pvs, pairing.as_ref());

    let singles = grouping.singles.iter().map(|pv| vec![pv.as_str()]);
    let pairs = grouping
        .pairs
        .iter()
        .map(|(a, b)| vec![a.as_str(), b.as_str()]);
    let groups = singles
        .chain(pairs)
        .map(|pvs| resolve_group(config, &pvs, lookup))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Classification { grouping, groups })
}

fn resolve_group(
    config: &BuildConfig,
    pvs: &[&str],
    lookup: &dyn PvLookup,
) -> Result<PvGroup, BuildError> {
    let explicit = pvs
        .iter()
        .map(|pv| config.record_types.get(*pv).map(String::as_str))
        .collect::<Option<Vec<_>>>();
    let description = pvs
        .iter()
        .find_map(|pv| config.descriptions.get(*pv))
        .map(String::as_str);
    resolve(
        &config.macros,
        pvs,
        explicit.as_deref(),
        description,
        lookup,
    )
}

/// Build a complete screen from a PV list and template source.
pub fn generate<S: AsRef<str>>(
    config: &BuildConfig,
    raw_lines: &[S],
    template_source: &str,
    lookup: &dyn PvLookup,
) -> Result<Generated, BuildError> {
    let (mut document, catalog) = TemplateCatalog::load(template_source)?;
    info!(templates = catalog.len(), "loaded template catalog");

    let Classification {
        grouping,
        mut groups,
    } = classify(config, raw_lines, lookup)?;

    let final_y = assemble(
        &mut document.root,
        &catalog,
        &mut groups,
        config.origin,
        &config.title,
        &config.macros,
        &config.sort,
        &config.layout,
    )?;

    Ok(Generated {
        xml: document.to_xml_string(),
        grouping,
        groups,
        final_y,
    })
}
