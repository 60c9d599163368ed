//! Clap argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage a multi-language static site stored in object storage.
#[derive(Parser)]
#[command(name = "polysite", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the site configuration file
    Init {
        /// Bucket serving the rendered website
        #[arg(long)]
        website_bucket: String,

        /// Bucket holding the editable state and backups
        #[arg(long)]
        backup_bucket: String,

        /// Storage region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Custom storage endpoint URL (MinIO, R2, ...)
        #[arg(long)]
        endpoint: Option<String>,

        /// Site title, used to name exported archives
        #[arg(long)]
        title: Option<String>,
    },

    /// Check configuration and local tooling
    Check,

    /// Show the current site state and backups
    Status,

    /// Download the editable site state into a local directory
    Pull {
        /// Directory to write into (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Save a local directory back as the current site state
    Save {
        /// Directory to read from (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Render the site and publish it to the website bucket
    Deploy,

    /// Render the site into a local zip archive
    Download {
        /// Directory to write the archive into (defaults to the current
        /// directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Manage backups of the editable state
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// List backups, newest first
    List,

    /// Snapshot the current editable state
    Create {
        /// Backup name (a timestamp is always appended)
        name: Option<String>,
    },

    /// Delete a backup
    Delete {
        /// Backup folder name, as printed by `backup list`
        folder: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Replace the editable state with a backup's contents
    Restore {
        /// Backup folder name, as printed by `backup list`
        folder: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
