//! CLI entrypoint for opi-builder.

#[path = "opi-builder/cli.rs"]
mod cli;
#[path = "opi-builder/commands.rs"]
mod commands;
#[path = "opi-builder/style.rs"]
mod style;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::BuildOverrides;

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build {
            classify,
            output,
            title,
            sort,
            x_scale,
            y_scale,
            spacing,
            template,
            json,
        } => commands::run_build(
            classify,
            output,
            BuildOverrides {
                title,
                sort,
                x_scale,
                y_scale,
                spacing,
                template,
            },
            json,
        ),
        Command::Groups { classify, json } => commands::run_groups(classify, json),
        Command::Templates { template, json } => commands::run_templates(template, json),
    }
}
