//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RCL container bring-up
#[derive(Parser, Debug)]
#[command(name = "rclctl")]
#[command(about = "Validate the host and bring up the RCL service container", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Print debug messages on the console as well as the log file
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to /etc/rcl/rclctl.toml when present)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Container configuration file (overrides the settings file)
    #[arg(short = 'c', long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Subcommand (if not provided, runs `start`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Validate the host, persist the configuration and start the container
    Start {
        /// Install the image from this tarball instead of the registry
        #[arg(short = 'f', long)]
        image_file: Option<PathBuf>,

        /// Image version to install (prompted for when omitted)
        #[arg(long)]
        image_version: Option<String>,
    },

    /// Run the validation gates without writing or touching the container
    Check,

    /// Show whether the container is running
    Status,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start {
            image_file: None,
            image_version: None,
        })
    }
}
