//! Site command handlers: check, status, deploy, download.

use std::path::PathBuf;

use polysite_core::config::SiteConfig;
use polysite_core::render::ComrakRenderer;
use polysite_core::sass::{is_sass_available, print_install_instructions, sass_version, SassBinary};
use polysite_core::session::{Session, SessionStatus, StatusCallback};
use polysite_core::template::Renderer;

pub(super) fn print_status() -> StatusCallback<'static> {
    &|status: SessionStatus| println!("  {}", status)
}

/// Handle the check command
/// Returns true when everything required for deploys is in place
pub fn handle_check() -> bool {
    let mut ok = true;

    match SiteConfig::load() {
        Ok(Some(config)) => {
            println!("✓ Configuration found");
            println!("  Website bucket: {}", config.website_bucket);
            println!("  Backup bucket:  {}", config.backup_bucket);
            println!("  Region: {}", config.region);
            if let Some(endpoint) = &config.endpoint {
                println!("  Endpoint: {}", endpoint);
            }
        }
        Ok(None) => {
            eprintln!("✗ No configuration found. Run `polysite init` first.");
            ok = false;
        }
        Err(e) => {
            eprintln!("✗ Could not read configuration: {}", e);
            ok = false;
        }
    }

    if is_sass_available() {
        match sass_version() {
            Some(version) => println!("✓ sass found: {}", version),
            None => println!("✓ sass found"),
        }
    } else {
        print_install_instructions();
        ok = false;
    }

    ok
}

/// Handle the status command
/// Returns true on success, false on error
pub async fn handle_status(session: &Session) -> bool {
    let loaded = match session.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ Could not load site: {}", e);
            return false;
        }
    };

    println!("Languages:");
    for translation in &loaded.content.translations {
        println!("  {} ({})", translation.lang, translation.codes);
    }
    println!("Images: {}", loaded.content.initial_images.len());
    println!("Theme files:");
    for file in &loaded.theme.files {
        println!("  {}", file.name);
    }
    println!("Favicons: {}", loaded.theme.initial_favicon_files.len());
    println!("Backups:");
    if loaded.backups.is_empty() {
        println!("  (none)");
    }
    for backup in &loaded.backups {
        println!("  {}", backup);
    }
    true
}

/// Handle the deploy command
/// Returns true on success, false on error
pub async fn handle_deploy(session: &Session) -> bool {
    if !is_sass_available() {
        print_install_instructions();
        return false;
    }

    let loaded = match session.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ Could not load site: {}", e);
            return false;
        }
    };

    let result = session
        .deploy(
            &loaded.content,
            &loaded.theme,
            &ComrakRenderer,
            &Renderer,
            &SassBinary,
            print_status(),
        )
        .await;

    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("✗ Deploy failed: {}", e);
            false
        }
    }
}

/// Handle the download command
/// Returns true on success, false on error
pub async fn handle_download(session: &Session, output: Option<PathBuf>) -> bool {
    if !is_sass_available() {
        print_install_instructions();
        return false;
    }

    let loaded = match session.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ Could not load site: {}", e);
            return false;
        }
    };

    let archive = match session
        .download(
            &loaded.content,
            &loaded.theme,
            &ComrakRenderer,
            &Renderer,
            &SassBinary,
            print_status(),
        )
        .await
    {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("✗ Download failed: {}", e);
            return false;
        }
    };

    let path = output.unwrap_or_else(|| PathBuf::from(".")).join(&archive.name);
    match std::fs::write(&path, &archive.content) {
        Ok(()) => {
            println!("✓ Wrote {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ Could not write {}: {}", path.display(), e);
            false
        }
    }
}
