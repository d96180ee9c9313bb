//! Display assembly: title, macros and PV rows in one column.

use tracing::info;

use crate::error::BuildError;
use crate::instantiate::{instantiate, Cursor, Fields, LayoutOptions};
use crate::macros::MacroTable;
use crate::record::PvGroup;
use crate::template::{TemplateCatalog, TITLE_TEMPLATE};
use crate::xml::Element;

const MACROS_TAG: &str = "macros";

/// Group field used to order rows, resolved from a user sort name.
///
/// `pv` sorts by the description PV and `type` by template name; any other
/// group field name sorts by that field. Unknown names keep input order.
#[must_use]
pub fn sort_field(sort: &str) -> Option<&str> {
    match sort {
        "" => None,
        "pv" => Some("desc_pv"),
        "type" => Some("template"),
        other => Some(other),
    }
}

/// Order `groups` in place by `sort`; stable, so ties keep input order.
pub fn sort_groups(groups: &mut [PvGroup], sort: &str) {
    let Some(field) = sort_field(sort) else {
        return;
    };
    if !groups.iter().all(|group| group.field(field).is_some()) {
        return;
    }
    groups.sort_by(|a, b| a.field(field).cmp(&b.field(field)));
}

/// Add one `<NAME>value</NAME>` entry per macro to the root's macros block.
pub fn inject_macros(root: &mut Element, macros: &MacroTable) {
    if macros.is_empty() {
        return;
    }
    if root.child(MACROS_TAG).is_none() {
        root.push_element(Element::new(MACROS_TAG));
    }
    let Some(block) = root.child_mut(MACROS_TAG) else {
        return;
    };
    for (name, value) in macros {
        info!("Macro set {name}={value}");
        block.push_element(Element::with_text(name.as_str(), value.as_str()));
    }
}

/// Lay out the title and every group below `origin`.
///
/// Returns the final cursor height.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    root: &mut Element,
    catalog: &TemplateCatalog,
    groups: &mut [PvGroup],
    origin: Cursor,
    title: &str,
    macros: &MacroTable,
    sort: &str,
    layout: &LayoutOptions,
) -> Result<f64, BuildError> {
    let shared = layout.fields();
    let mut y = origin.y;

    if !title.is_empty() {
        let mut fields = shared.clone();
        fields.insert("title".to_string(), title.to_string());
        y = instantiate(
            catalog,
            Cursor::new(origin.x, y),
            root,
            TITLE_TEMPLATE,
            layout,
            &fields,
        )?;
    }

    inject_macros(root, macros);
    sort_groups(groups, sort);

    for group in groups.iter() {
        let mut fields: Fields = shared.clone();
        for (key, value) in group.fields() {
            fields.insert(key.to_string(), value);
        }
        y = instantiate(
            catalog,
            Cursor::new(origin.x, y),
            root,
            &group.template_name,
            layout,
            &fields,
        )?;
    }
    Ok(y)
}
