//! Command-line interface for polysite.

/// Clap argument definitions
mod args;

/// Backup command handlers
mod backup;

/// Site command handlers (check, status, deploy, download)
mod site;

/// Local workspace handlers (pull, save)
mod workspace;

use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Runtime;

use polysite_core::config::SiteConfig;
use polysite_core::session::Session;
use polysite_core::store::StorageClient;

use crate::s3::S3Store;

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI
pub fn run_cli() {
    env_logger::init();
    let cli = Cli::parse();

    let success = match cli.command {
        Commands::Init {
            website_bucket,
            backup_bucket,
            region,
            endpoint,
            title,
        } => handle_init(website_bucket, backup_bucket, region, endpoint, title),

        Commands::Check => site::handle_check(),

        command => {
            let config = match SiteConfig::load() {
                Ok(Some(config)) => config,
                Ok(None) => {
                    eprintln!("✗ No configuration found. Run `polysite init` first.");
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("✗ Could not read configuration: {}", e);
                    std::process::exit(1);
                }
            };

            let runtime = match Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("✗ Could not start async runtime: {}", e);
                    std::process::exit(1);
                }
            };

            runtime.block_on(async {
                let store: Arc<dyn StorageClient> = Arc::new(S3Store::connect(&config).await);
                let session = Session::new(
                    store,
                    config.website_bucket.clone(),
                    config.backup_bucket.clone(),
                    config.site_title.clone(),
                );

                match command {
                    Commands::Status => site::handle_status(&session).await,
                    Commands::Pull { dir } => workspace::handle_pull(&session, dir).await,
                    Commands::Save { dir } => workspace::handle_save(&session, dir).await,
                    Commands::Deploy => site::handle_deploy(&session).await,
                    Commands::Download { output } => {
                        site::handle_download(&session, output).await
                    }
                    Commands::Backup { command } => {
                        backup::handle_backup_command(&session, command).await
                    }
                    // handled before the session is built
                    Commands::Init { .. } | Commands::Check => unreachable!(),
                }
            })
        }
    };

    if !success {
        std::process::exit(1);
    }
}

/// Handle the init command
/// Returns true on success, false on error
fn handle_init(
    website_bucket: String,
    backup_bucket: String,
    region: String,
    endpoint: Option<String>,
    title: Option<String>,
) -> bool {
    let mut config = SiteConfig::new(website_bucket, backup_bucket);
    config.region = region;
    config.endpoint = endpoint;
    if let Some(title) = title {
        config.site_title = title;
    }

    match config.save() {
        Ok(()) => {
            println!("✓ Initialized polysite configuration");
            println!("  Website bucket: {}", config.website_bucket);
            println!("  Backup bucket:  {}", config.backup_bucket);
            if let Some(path) = SiteConfig::config_path() {
                println!("  Config file: {}", path.display());
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Error writing config: {}", e);
            false
        }
    }
}

/// Ask a yes/no question on stdin, defaulting to no.
pub(crate) fn confirm(question: &str) -> bool {
    use std::io::{self, Write};

    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        eprintln!("✗ Failed to read input");
        return false;
    }

    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}
