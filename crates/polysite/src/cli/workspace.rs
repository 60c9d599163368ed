//! Local workspace handlers: pull the editable state into a directory,
//! edit it with any tools, and save it back.
//!
//! The directory mirrors the storage layout:
//!
//! ```text
//! <dir>/content.json   <dir>/<lang>.md
//! <dir>/images/        <dir>/theme/        <dir>/favicon/
//! ```

use std::path::{Path, PathBuf};

use polysite_core::artifact::{content_type_for, Artifact};
use polysite_core::codec;
use polysite_core::error::Result;
use polysite_core::session::Session;
use polysite_core::theme::Theme;

use super::site::print_status;

const IMAGE_DIR: &str = "images";
const THEME_DIR: &str = "theme";
const FAVICON_DIR: &str = "favicon";

/// MIME types for binary uploads, keyed by extension.
fn media_type(name: &str) -> &'static str {
    match name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for artifact in artifacts {
        std::fs::write(dir.join(&artifact.name), &artifact.content)?;
    }
    Ok(())
}

/// Read every regular file directly inside `dir` as an artifact. A missing
/// directory reads as empty.
fn read_artifacts(dir: &Path) -> std::io::Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    if !dir.is_dir() {
        return Ok(artifacts);
    }
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let bytes = std::fs::read(entry.path())?;
        let content_type = content_type_for(&name).unwrap_or_else(|| media_type(&name));
        artifacts.push(Artifact::binary(name, bytes, content_type));
    }
    Ok(artifacts)
}

/// Handle the pull command
/// Returns true on success, false on error
pub async fn handle_pull(session: &Session, dir: Option<PathBuf>) -> bool {
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));

    let loaded = match session.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ Could not load site: {}", e);
            return false;
        }
    };

    let content_files = match codec::encode(&loaded.content) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("✗ Could not encode content: {}", e);
            return false;
        }
    };

    let result = write_artifacts(&dir, &content_files)
        .and_then(|()| write_artifacts(&dir.join(IMAGE_DIR), &loaded.content.initial_images))
        .and_then(|()| write_artifacts(&dir.join(THEME_DIR), &loaded.theme.encode_files()))
        .and_then(|()| {
            write_artifacts(&dir.join(FAVICON_DIR), &loaded.theme.initial_favicon_files)
        });
    match result {
        Ok(()) => {
            println!("✓ Pulled site into {}", dir.display());
            true
        }
        Err(e) => {
            eprintln!("✗ Could not write {}: {}", dir.display(), e);
            false
        }
    }
}

/// Rebuild the editable aggregates from a local workspace directory.
fn read_workspace(dir: &Path) -> Result<(polysite_core::content::Content, Theme)> {
    let content_files = read_artifacts(dir)?;
    let mut content = codec::decode(&content_files)?;
    content.initial_images = read_artifacts(&dir.join(IMAGE_DIR))?;

    let theme_files = read_artifacts(&dir.join(THEME_DIR))?;
    let favicons = read_artifacts(&dir.join(FAVICON_DIR))?;
    let theme = Theme::decode(&theme_files, favicons)?;
    Ok((content, theme))
}

/// Handle the save command
/// Returns true on success, false on error
pub async fn handle_save(session: &Session, dir: Option<PathBuf>) -> bool {
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));

    let (content, theme) = match read_workspace(&dir) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("✗ Could not read {}: {}", dir.display(), e);
            return false;
        }
    };

    match session.save(&content, &theme, print_status()).await {
        Ok(()) => true,
        Err(e) => {
            eprintln!("✗ Save failed: {}", e);
            false
        }
    }
}
