//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::services::Toggle;
use crate::domain::{GroupId, UnreferencedGroups, Visibility};

/// Optional content (layer) visibility model: inspect and toggle document layers
#[derive(Parser, Debug)]
#[command(name = "layertree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file applied over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Placement of groups the display order never names (default: from config)
    #[arg(long, global = true, value_enum)]
    pub unreferenced: Option<UnreferencedArg>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the layer tree
    Tree {
        /// Layer description file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// List every group with its state
    States {
        /// Layer description file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Switch groups on or off, in the given order
    Toggle {
        /// Layer description file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Changes as NUM[:GEN]=on|off, e.g. 12=on 7:1=off
        #[arg(required = true, value_parser = parse_toggle)]
        changes: Vec<Toggle>,
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
    /// Show merged config
    Show,

    /// Create global config template
    Init,

    /// Show config paths
    Path,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnreferencedArg {
    /// Leave unreferenced groups out of the tree
    Omit,
    /// List them under the root after the ordered entries
    Append,
}

impl From<UnreferencedArg> for UnreferencedGroups {
    fn from(arg: UnreferencedArg) -> Self {
        match arg {
            UnreferencedArg::Omit => UnreferencedGroups::Omit,
            UnreferencedArg::Append => UnreferencedGroups::AppendToRoot,
        }
    }
}

/// Parse `NUM[:GEN]=on|off`.
pub fn parse_toggle(s: &str) -> Result<Toggle, String> {
    let (id, state) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NUM[:GEN]=on|off, got '{}'", s))?;

    let id = match id.split_once(':') {
        Some((num, gen)) => GroupId::new(
            num.trim().parse().map_err(|e| format!("object number '{}': {}", num, e))?,
            gen.trim().parse().map_err(|e| format!("generation '{}': {}", gen, e))?,
        ),
        None => GroupId::from(
            id.trim()
                .parse::<u32>()
                .map_err(|e| format!("object number '{}': {}", id, e))?,
        ),
    };

    let visibility = match state.trim().to_ascii_lowercase().as_str() {
        "on" => Visibility::On,
        "off" => Visibility::Off,
        other => return Err(format!("state must be on or off, got '{}'", other)),
    };

    Ok(Toggle { id, visibility })
}
