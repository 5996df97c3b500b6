//! Clap derive structures for the `appdx` CLI.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use appdx_core::Mode;

/// appdx -- export and migrate AppDynamics controller configuration
#[derive(Debug, Parser)]
#[command(
    name = "appdx",
    version,
    about = "Export and migrate AppDynamics controller configuration",
    long_about = "Exports application and account configuration from an AppDynamics\n\
        controller to JSON files, or migrates application configuration to a\n\
        second controller, through a locally running Config Exporter service.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Workflow to run
    #[arg(long, short = 'm', value_enum)]
    pub mode: ModeArg,

    /// Path to the shell-style config file
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: PathBuf,

    /// Launch the Config Exporter with this shell command before the run
    #[arg(long, short = 'r', value_name = "COMMAND")]
    pub run: Option<String>,

    /// Seconds to wait for the Config Exporter to answer
    #[arg(long, value_name = "SECS", default_value_t = 120)]
    pub exporter_wait: u64,

    /// Directory for the persistent log file (appdx.log)
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Disable coloured console output (also honours NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Colour is off with `--no-color` or a non-empty `NO_COLOR`.
    pub fn color_enabled(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Write configuration JSON under the output directory
    Export,
    /// Copy application configuration to the destination controller
    Migrate,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Export => Self::Export,
            ModeArg::Migrate => Self::Migrate,
        }
    }
}
