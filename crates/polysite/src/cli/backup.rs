//! Backup command handlers.

use polysite_core::session::Session;

use super::args::BackupCommands;
use super::confirm;

/// Handle `backup` subcommands
/// Returns true on success, false on error
pub async fn handle_backup_command(session: &Session, command: BackupCommands) -> bool {
    match command {
        BackupCommands::List => handle_list(session).await,
        BackupCommands::Create { name } => handle_create(session, name).await,
        BackupCommands::Delete { folder, yes } => handle_delete(session, &folder, yes).await,
        BackupCommands::Restore { folder, yes } => handle_restore(session, &folder, yes).await,
    }
}

async fn handle_list(session: &Session) -> bool {
    match session.backups().list().await {
        Ok(backups) => {
            if backups.is_empty() {
                println!("No backups.");
            }
            for backup in backups {
                println!("{}", backup);
            }
            true
        }
        Err(e) => {
            eprintln!("✗ Could not list backups: {}", e);
            false
        }
    }
}

async fn handle_create(session: &Session, name: Option<String>) -> bool {
    let loaded = match session.load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("✗ Could not load site: {}", e);
            return false;
        }
    };

    match session
        .backups()
        .create(name.as_deref().unwrap_or(""), &loaded.content, &loaded.theme)
        .await
    {
        Ok(folder) => {
            println!("✓ Created backup {}", folder);
            true
        }
        Err(e) => {
            eprintln!("✗ Could not create backup: {}", e);
            false
        }
    }
}

async fn handle_delete(session: &Session, folder: &str, yes: bool) -> bool {
    if !yes && !confirm(&format!("Delete backup {}? This cannot be undone.", folder)) {
        println!("Cancelled.");
        return true;
    }

    match session.backups().delete(folder).await {
        Ok(()) => {
            println!("✓ Deleted backup {}", folder);
            true
        }
        Err(e) => {
            eprintln!("✗ Could not delete backup: {}", e);
            false
        }
    }
}

async fn handle_restore(session: &Session, folder: &str, yes: bool) -> bool {
    if !yes
        && !confirm(&format!(
            "Restore backup {}? The current site state will be replaced.",
            folder
        ))
    {
        println!("Cancelled.");
        return true;
    }

    match session.backups().restore(folder).await {
        Ok(safety) => {
            println!("✓ Restored backup {}", folder);
            println!("  Previous state saved as {}", safety);
            true
        }
        Err(e) => {
            eprintln!("✗ Could not restore backup: {}", e);
            false
        }
    }
}
