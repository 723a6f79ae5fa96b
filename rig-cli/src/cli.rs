//! Root CLI structure for rigkit

use clap::{Parser, Subcommand, ValueEnum};
use rig_collada::EndPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rigkit")]
#[command(about = "Inspect skinned COLLADA models and their animations", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON settings file (max_influences, skeleton_root, up_axis, end_policy)
    #[arg(short, long, global = true, env = "RIGKIT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display a summary of a model
    Info {
        /// Path to the scene document
        file: PathBuf,
    },

    /// Display the joint hierarchy as a tree
    Tree {
        /// Path to the scene document
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show joint ids and bind positions
        #[arg(short, long)]
        metadata: bool,
    },

    /// Print skinning matrices at a point of the document's animation
    Pose {
        /// Path to the scene document
        file: PathBuf,

        /// Time since the start of playback, in milliseconds
        #[arg(short, long, default_value = "0")]
        time: f64,

        /// What happens past the end of the animation (overrides the settings file)
        #[arg(short, long, value_enum)]
        end_policy: Option<EndPolicyArg>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load a model and its animation and check their invariants
    Validate {
        /// Path to the scene document
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// End-of-animation policy as given on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EndPolicyArg {
    Wrap,
    Clamp,
}

impl From<EndPolicyArg> for EndPolicy {
    fn from(arg: EndPolicyArg) -> Self {
        match arg {
            EndPolicyArg::Wrap => Self::Wrap,
            EndPolicyArg::Clamp => Self::Clamp,
        }
    }
}
