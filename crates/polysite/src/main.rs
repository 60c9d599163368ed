//! polysite - manage a multi-language static site stored in object storage.

/// CLI module - command-line interface for polysite
mod cli;

/// S3 storage client
mod s3;

fn main() {
    cli::run_cli();
}
