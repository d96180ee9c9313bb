//! Widget template catalog.

#![allow(missing_docs)]

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::BuildError;
use crate::xml::{Document, Element};

/// Title widget placed above all PV rows.
pub const TITLE_TEMPLATE: &str = "title_group";

const WIDGET_TAG: &str = "widget";

/// A named widget sub-tree available for instantiation.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub height: i64,
    pub widget: Element,
}

/// Templates extracted from a template document, keyed by widget name.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: IndexMap<String, Template>,
}

impl TemplateCatalog {
    /// Parse `source` and move every top-level widget into the catalog.
    ///
    /// The returned document is the display skeleton with those widgets
    /// removed; generated rows are appended to its root.
    pub fn load(source: &str) -> Result<(Document, Self), BuildError> {
        let mut document = Document::parse(source)?;
        let widgets = document
            .root
            .remove_elements(|element| element.name == WIDGET_TAG);

        let mut templates = IndexMap::new();
        for widget in widgets {
            let name = widget
                .child_text("name")
                .ok_or_else(|| BuildError::MissingField {
                    widget: "<unnamed>".into(),
                    field: "name".into(),
                })?;
            let height_text =
                widget
                    .child_text("height")
                    .ok_or_else(|| BuildError::MissingField {
                        widget: name.as_str().into(),
                        field: "height".into(),
                    })?;
            let height = parse_int_field(&name, "height", &height_text)?;
            debug!(template = %name, height, "loaded template");
            let template = Template {
                name: name.clone(),
                height,
                widget,
            };
            if templates.insert(name.clone(), template).is_some() {
                warn!("duplicate template '{name}', keeping the last definition");
            }
        }
        Ok((document, Self { templates }))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Template names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Parse an integer geometry field, accepting surrounding whitespace.
pub(crate) fn parse_int_field(widget: &str, field: &str, text: &str) -> Result<i64, BuildError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| BuildError::InvalidField {
            widget: widget.into(),
            field: field.into(),
            value: text.trim().into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<display typeId="org.csstudio.opibuilder.Display" version="1.0.0">
  <macros>
    <include_parent_macros>true</include_parent_macros>
  </macros>
  <name>ANC300</name>
  <widget typeId="org.csstudio.opibuilder.widgets.groupingContainer" version="1.0.0">
    <name>title_group</name>
    <x>0</x><y>0</y><width>300</width><height>30</height>
  </widget>
  <widget typeId="org.csstudio.opibuilder.widgets.groupingContainer" version="1.0.0">
    <name>text_ro_group</name>
    <x>0</x><y>0</y><width>300</width><height> 20 </height>
  </widget>
</display>
"#;

    #[test]
    fn load_moves_widgets_into_catalog() {
        let (document, catalog) = TemplateCatalog::load(TEMPLATE).expect("load");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["title_group", "text_ro_group"]
        );
        assert_eq!(catalog.get("text_ro_group").expect("template").height, 20);
        assert!(document.root.child("widget").is_none());
        assert!(document.root.child("macros").is_some());
        assert_eq!(document.root.child_text("name").as_deref(), Some("ANC300"));
    }

    #[test]
    fn widget_without_height_is_rejected() {
        let err = TemplateCatalog::load("<display><widget><name>x</name></widget></display>")
            .expect_err("must fail");
        assert_eq!(
            err,
            BuildError::MissingField {
                widget: "x".into(),
                field: "height".into(),
            }
        );
    }

    #[test]
    fn widget_without_name_is_rejected() {
        let err = TemplateCatalog::load("<display><widget><height>3</height></widget></display>")
            .expect_err("must fail");
        assert!(matches!(err, BuildError::MissingField { ref field, .. } if field == "name"));
    }

    #[test]
    fn non_numeric_height_is_rejected() {
        let err = TemplateCatalog::load(
            "<display><widget><name>x</name><height>tall</height></widget></display>",
        )
        .expect_err("must fail");
        assert!(matches!(err, BuildError::InvalidField { .. }));
    }

    #[test]
    fn malformed_template_is_a_parse_error() {
        let err = TemplateCatalog::load("<display><widget>").expect_err("must fail");
        assert!(matches!(err, BuildError::TemplateParse(_)));
    }

    #[test]
    fn duplicate_names_keep_last_definition() {
        let (_, catalog) = TemplateCatalog::load(
            "<display><widget><name>a</name><height>1</height></widget><widget><name>a</name><height>2</height></widget></display>",
        )
        .expect("load");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("a").expect("template").height, 2);
    }
}
