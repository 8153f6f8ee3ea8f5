// src/cli.rs
//! CLI definitions for kettle
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use kettle::Platform;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kettle")]
#[command(author = "Kettle Contributors")]
#[command(version)]
#[command(about = "Build packages from source with declarative formulas", long_about = None)]
pub struct Cli {
    /// Kitchen configuration file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to install and which platform to build for
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Installation prefix (default: from config, else /usr/local)
    #[arg(short, long)]
    pub prefix: Option<PathBuf>,

    /// Target platform: macos or linux (default: the running host)
    #[arg(long, value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// Root of the opt tree dependencies are installed under
    #[arg(long)]
    pub opt_root: Option<PathBuf>,

    /// Prefix of the active package-manager installation
    #[arg(long)]
    pub host_prefix: Option<PathBuf>,
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    s.parse()
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show formula metadata and dependencies per platform
    Info {
        /// Built-in formula name or path to a formula file
        formula: String,
    },

    /// Evaluate the formula's requirements on this host
    Check {
        /// Built-in formula name or path to a formula file
        formula: String,

        /// Target platform: macos or linux (default: the running host)
        #[arg(long, value_parser = parse_platform)]
        platform: Option<Platform>,

        /// Prefix of the active package-manager installation
        #[arg(long)]
        host_prefix: Option<PathBuf>,
    },

    /// Print the build plan without running it
    Plan {
        /// Built-in formula name or path to a formula file
        formula: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Output the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch, patch, build, and install a formula
    Brew {
        /// Built-in formula name or path to a formula file
        formula: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Directory for caching downloaded sources
        #[arg(long)]
        source_cache: Option<PathBuf>,

        /// Number of parallel make jobs
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Keep build directory after completion (for debugging)
        #[arg(long)]
        keep_builddir: bool,

        /// Only fetch sources, patches, and resources; don't build
        #[arg(long)]
        fetch_only: bool,
    },

    /// Print post-install instructions
    Caveats {
        /// Built-in formula name or path to a formula file
        formula: String,

        /// Installation prefix (default: from config, else /usr/local)
        #[arg(short, long)]
        prefix: Option<PathBuf>,
    },

    /// Run the formula's smoke test against an installed prefix
    Test {
        /// Built-in formula name or path to a formula file
        formula: String,

        /// Installation prefix (default: from config, else /usr/local)
        #[arg(short, long)]
        prefix: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
