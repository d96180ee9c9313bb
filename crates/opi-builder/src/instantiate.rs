//! Template instantiation and vertical placement.

#![allow(missing_docs)]

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::BuildError;
use crate::template::{parse_int_field, TemplateCatalog};
use crate::xml::{escape_attr, parse_element, Element};

/// Placeholder values keyed by `%(key)s` name.
pub type Fields = IndexMap<String, String>;

/// How the layout cursor maps onto a widget's own `x`/`y` fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionScaling {
    /// Cursor scaled twice (`x * scale * scale`), matching screens produced
    /// by earlier releases of the generator.
    #[default]
    Compound,
    /// Cursor scaled once.
    Single,
}

/// Geometry settings shared by every placed widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub x_scale: f64,
    pub y_scale: f64,
    pub spacing: f64,
    pub position_scaling: PositionScaling,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            x_scale: 1.0,
            y_scale: 1.0,
            spacing: 5.0,
            position_scaling: PositionScaling::Compound,
        }
    }
}

impl LayoutOptions {
    /// Layout values exposed to templates alongside group fields.
    ///
    /// Whole numbers keep their fractional part (`1.0`, not `1`).
    #[must_use]
    pub fn fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("x_scale".to_string(), format!("{:?}", self.x_scale));
        fields.insert("y_scale".to_string(), format!("{:?}", self.y_scale));
        fields.insert("spacing".to_string(), format!("{:?}", self.spacing));
        fields
    }
}

/// Current placement position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

impl Cursor {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Place a copy of `template_name` at `cursor` under `parent`.
///
/// Returns the next free vertical offset. A template missing from the
/// catalog is skipped and the cursor is returned unchanged.
pub fn instantiate(
    catalog: &TemplateCatalog,
    cursor: Cursor,
    parent: &mut Element,
    template_name: &str,
    layout: &LayoutOptions,
    fields: &Fields,
) -> Result<f64, BuildError> {
    let Some(template) = catalog.get(template_name) else {
        warn!("Template {template_name} unavailable");
        return Ok(cursor.y);
    };
    let mut widget = template.widget.clone();

    if layout.x_scale != 1.0 {
        scale_field(&mut widget, template_name, "x", layout.x_scale)?;
        scale_field(&mut widget, template_name, "width", layout.x_scale)?;
    }
    if layout.y_scale != 1.0 {
        scale_field(&mut widget, template_name, "y", layout.y_scale)?;
        scale_field(&mut widget, template_name, "height", layout.y_scale)?;
    }

    let px = cursor.x * layout.x_scale;
    let py = cursor.y * layout.y_scale;
    let (x, y) = match layout.position_scaling {
        PositionScaling::Compound => (px * layout.x_scale, py * layout.y_scale),
        PositionScaling::Single => (px, py),
    };
    set_geometry(&mut widget, template_name, "x", truncate(x))?;
    set_geometry(&mut widget, template_name, "y", truncate(y))?;

    let height_text = widget
        .child_text("height")
        .ok_or_else(|| missing(template_name, "height"))?;
    let height = parse_int_field(template_name, "height", &height_text)?;

    let element = instantiate_template(&widget, template_name, fields)?;
    parent.push_element(element);
    debug!(template = template_name, x, y, height, "placed widget");

    Ok(cursor.y + layout.spacing + height as f64)
}

/// Serialize `widget`, fill its `%(key)s` placeholders and parse it back.
pub fn instantiate_template(
    widget: &Element,
    template_name: &str,
    fields: &Fields,
) -> Result<Element, BuildError> {
    let text = widget.to_xml();
    let filled = substitute_placeholders(&text, template_name, fields)?;
    parse_element(&filled)
}

/// Replace `%(key)s` with the XML-escaped field value and `%%` with `%`.
///
/// Any other `%` is copied through unchanged.
fn substitute_placeholders(
    text: &str,
    template_name: &str,
    fields: &Fields,
) -> Result<String, BuildError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find('%') {
        out.push_str(&rest[..index]);
        let tail = &rest[index..];
        if let Some(after) = tail.strip_prefix("%%") {
            out.push('%');
            rest = after;
            continue;
        }
        if let Some((key, after)) = placeholder(tail) {
            let value = fields
                .get(key)
                .ok_or_else(|| BuildError::MissingPlaceholder {
                    template: template_name.into(),
                    key: key.into(),
                })?;
            out.push_str(&escape_attr(value));
            rest = after;
            continue;
        }
        out.push('%');
        rest = &tail[1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Split `%(key)s...` into `key` and the remaining text.
fn placeholder(text: &str) -> Option<(&str, &str)> {
    let body = text.strip_prefix("%(")?;
    let close = body.find(')')?;
    let key = &body[..close];
    let after = body[close + 1..].strip_prefix('s')?;
    if key.is_empty() || key.contains(['(', '<', '>', '%']) {
        return None;
    }
    Some((key, after))
}

/// Scale `field` on `widget` and every nested widget, truncating to integer.
fn scale_field(
    widget: &mut Element,
    template_name: &str,
    field: &str,
    scale: f64,
) -> Result<(), BuildError> {
    let text = widget
        .child_text(field)
        .ok_or_else(|| missing(&widget_label(widget, template_name), field))?;
    #[allow(clippy::cast_precision_loss)]
    let value = parse_int_field(&widget_label(widget, template_name), field, &text)? as f64;
    widget.set_child_text(field, truncate(value * scale).to_string());
    for child in widget.elements_mut().filter(|child| child.name == "widget") {
        scale_field(child, template_name, field, scale)?;
    }
    Ok(())
}

fn set_geometry(
    widget: &mut Element,
    template_name: &str,
    field: &str,
    value: i64,
) -> Result<(), BuildError> {
    if widget.set_child_text(field, value.to_string()) {
        Ok(())
    } else {
        Err(missing(template_name, field))
    }
}

fn widget_label(widget: &Element, template_name: &str) -> String {
    widget
        .child_text("name")
        .unwrap_or_else(|| template_name.to_string())
}

fn missing(widget: &str, field: &str) -> BuildError {
    BuildError::MissingField {
        widget: widget.into(),
        field: field.into(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}
