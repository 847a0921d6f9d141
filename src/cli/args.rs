//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::FlagSetting;

/// Conditional visibility for annotated documents: evaluate conditions, propagate, toggle properties
#[derive(Parser, Debug)]
#[command(name = "jobad")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory with a local .jobad.toml (default: the document's directory)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a condition against property values
    Eval {
        /// Condition, e.g. "and(verbose=true,not(level<3))"
        expr: String,
        /// Property value NAME=VALUE (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
    },

    /// Parse a condition and print its canonical form
    Parse {
        /// Condition to parse
        expr: String,
    },

    /// Evaluate a document and show its visibility tree
    Show {
        /// Document file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        document: PathBuf,
    },

    /// Show the inherited property context of a node
    Context {
        /// Document file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        document: PathBuf,
        /// Node id
        node: String,
    },

    /// Change a declared property and show the re-evaluated document
    Set {
        /// Document file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        document: PathBuf,
        /// Node id carrying the declaration
        node: String,
        /// New value
        value: String,
    },

    /// Show, hide or inherit a display flag on a node
    Flag {
        /// Document file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        document: PathBuf,
        /// Node id
        node: String,
        /// Flag name, e.g. "reconstructed"
        flag: String,
        /// New setting
        #[arg(value_enum)]
        setting: FlagArg,
    },

    /// List input controls for declared properties
    Controls {
        /// Document file (TOML)
        #[arg(value_hint = ValueHint::FilePath)]
        document: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Print a template config file
    Template,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagArg {
    Show,
    Hide,
    Inherit,
}

impl From<FlagArg> for FlagSetting {
    fn from(arg: FlagArg) -> Self {
        match arg {
            FlagArg::Show => FlagSetting::Show,
            FlagArg::Hide => FlagSetting::Hide,
            FlagArg::Inherit => FlagSetting::Inherit,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    if key.trim().is_empty() {
        return Err(format!("empty property name in `{}`", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}
