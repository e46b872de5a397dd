use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vhdsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep Hyper-V virtual disks in line with a declared inventory", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, global = true, env = "VHDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would do, from recorded state only
    Plan(TargetArgs),

    /// Create, replace or resize disks until they match the inventory
    Apply(ApplyArgs),

    /// Read every declared disk from the host and record it
    Status(TargetArgs),

    /// Print what the host reports for one disk, as JSON
    Show {
        /// Disk path on the host
        path: String,
    },

    /// Delete a disk and mark it absent
    Destroy {
        /// Disk path on the host
        path: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct TargetArgs {
    /// Only disks whose path contains this text
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only disks whose path contains this text
    pub target: Option<String>,

    /// Show what would change without doing it
    #[arg(long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of disks reconciled in parallel (default from config)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Times a failed cycle is retried (default from config)
    #[arg(long)]
    pub retries: Option<u32>,
}
