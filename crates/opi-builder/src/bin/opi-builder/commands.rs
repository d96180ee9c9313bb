//! Subcommand handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use opi_builder::config::PatternPair;
use opi_builder::macros::parse_macro_string;
use opi_builder::template::TemplateCatalog;
use opi_builder::{classify, generate, BuildConfig, CagetLookup, PvLookup, TableLookup};
use serde_json::json;

use crate::cli::ClassifyArgs;
use crate::style;

/// Overrides for layout and output, only set by `build`.
#[derive(Debug, Default)]
pub struct BuildOverrides {
    pub title: Option<String>,
    pub sort: Option<String>,
    pub x_scale: Option<f64>,
    pub y_scale: Option<f64>,
    pub spacing: Option<f64>,
    pub template: Option<PathBuf>,
}

pub fn run_build(
    args: ClassifyArgs,
    output: PathBuf,
    overrides: BuildOverrides,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(&args)?;
    if let Some(title) = overrides.title {
        config.title = title;
    }
    if let Some(sort) = overrides.sort {
        config.sort = sort;
    }
    if let Some(x_scale) = overrides.x_scale {
        config.layout.x_scale = x_scale;
    }
    if let Some(y_scale) = overrides.y_scale {
        config.layout.y_scale = y_scale;
    }
    if let Some(spacing) = overrides.spacing {
        config.layout.spacing = spacing;
    }
    if let Some(template) = overrides.template {
        config.template = template;
    }

    let lines = read_pv_list(&args.pv_list)?;
    let template = std::fs::read_to_string(&config.template)
        .with_context(|| format!("failed to read template {}", config.template.display()))?;
    let lookup = make_lookup(&config)?;
    let generated = generate(&config, &lines, &template, lookup.as_ref())?;
    std::fs::write(&output, &generated.xml)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if json {
        let report = json!({
            "output": output.display().to_string(),
            "grouping": generated.grouping,
            "groups": generated.groups,
            "final_y": generated.final_y,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "{}",
        style::success(format!("Wrote {}", output.display()))
    );
    println!(
        "Rows: {} ({} paired, {} single)",
        generated.groups.len(),
        generated.grouping.pairs.len(),
        generated.grouping.singles.len()
    );
    Ok(())
}

pub fn run_groups(args: ClassifyArgs, json: bool) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let lines = read_pv_list(&args.pv_list)?;
    let lookup = make_lookup(&config)?;
    let classification = classify(&config, &lines, lookup.as_ref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(());
    }
    for group in &classification.groups {
        let pvs = [group.readback_pv.as_str(), group.setpoint_pv.as_str()]
            .into_iter()
            .filter(|pv| !pv.is_empty())
            .collect::<Vec<_>>()
            .join(" / ");
        println!(
            "{} {pvs} {}",
            style::template_name(&group.template_name),
            group.description
        );
    }
    Ok(())
}

pub fn run_templates(template: PathBuf, json: bool) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&template)
        .with_context(|| format!("failed to read template {}", template.display()))?;
    let (_, catalog) = TemplateCatalog::load(&source)?;

    if json {
        let entries = catalog
            .iter()
            .map(|template| json!({ "name": template.name, "height": template.height }))
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for template in catalog.iter() {
        println!("{} (height {})", style::template_name(&template.name), template.height);
    }
    Ok(())
}

fn load_config(args: &ClassifyArgs) -> anyhow::Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::default(),
    };
    if let Some(macros) = &args.macros {
        config.macros = parse_macro_string(macros)?;
    }
    config.ignore.extend(args.ignore.iter().cloned());
    if let Some(pair) = pattern_pair(args.group.as_deref()) {
        config.group = Some(pair);
    }
    if let Some(pair) = pattern_pair(args.substitute.as_deref()) {
        config.substitute = Some(pair);
    }
    if let Some(table) = &args.pv_table {
        config.pv_table = Some(table.clone());
    }
    Ok(config)
}

fn pattern_pair(values: Option<&[String]>) -> Option<PatternPair> {
    match values {
        Some([pattern, replacement]) => Some(PatternPair::new(pattern, replacement)),
        _ => None,
    }
}

fn read_pv_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read PV list {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn make_lookup(config: &BuildConfig) -> anyhow::Result<Box<dyn PvLookup>> {
    match &config.pv_table {
        Some(path) => Ok(Box::new(TableLookup::load(path)?)),
        None => Ok(Box::new(CagetLookup::new(config.record_type_timeout))),
    }
}
