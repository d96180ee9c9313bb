//! CLI definitions for opi-builder.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "opi-builder",
    version,
    about = "Generate BOY operator screens from EPICS PV lists",
    infer_subcommands = true,
    after_help = "Examples:\n  opi-builder build pvs.txt axis.opi -m DEV=ANC300:,AX=1 -g '(.*)_IN' '\\1_OUT'\n  opi-builder groups pvs.txt -g '(.*)_IN' '\\1_OUT' --pv-table pvs.toml\n  opi-builder templates template.opi"
)]
pub struct Cli {
    /// Show debug diagnostics.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a screen from a PV list.
    Build {
        #[command(flatten)]
        classify: ClassifyArgs,
        /// Output .opi path.
        output: PathBuf,
        /// Screen title (empty string to omit).
        #[arg(long, short = 't')]
        title: Option<String>,
        /// Row order: desc, type, pv or another group field.
        #[arg(long, short = 'S')]
        sort: Option<String>,
        /// Horizontal scale factor.
        #[arg(long = "x-scale", short = 'x')]
        x_scale: Option<f64>,
        /// Vertical scale factor.
        #[arg(long = "y-scale", short = 'y')]
        y_scale: Option<f64>,
        /// Vertical gap between rows.
        #[arg(long)]
        spacing: Option<f64>,
        /// Template .opi file.
        #[arg(long, short = 'T')]
        template: Option<PathBuf>,
        /// Print a JSON report instead of a summary.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Show how a PV list pairs and classifies, without writing a screen.
    Groups {
        #[command(flatten)]
        classify: ClassifyArgs,
        /// Print JSON instead of a table.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// List the templates a template file provides.
    Templates {
        /// Template .opi file.
        template: PathBuf,
        /// Print JSON instead of a table.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
}

/// Flags shared by every command that reads a PV list.
#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// PV list, one name per line.
    pub pv_list: PathBuf,
    /// TOML build configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Drop PVs matching a pattern; repeat for several.
    #[arg(long, short = 'i', action = ArgAction::Append)]
    pub ignore: Vec<String>,
    /// Pair PVs whose name maps to another listed PV.
    #[arg(long, short = 'g', num_args = 2, value_names = ["PATTERN", "REPLACEMENT"])]
    pub group: Option<Vec<String>>,
    /// Rewrite every PV name before grouping.
    #[arg(long, short = 's', num_args = 2, value_names = ["PATTERN", "REPLACEMENT"])]
    pub substitute: Option<Vec<String>>,
    /// Display macros as NAME=VALUE,NAME=VALUE.
    #[arg(long, short = 'm')]
    pub macros: Option<String>,
    /// Offline record types and descriptions (TOML).
    #[arg(long)]
    pub pv_table: Option<PathBuf>,
}
