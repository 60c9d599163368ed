//! Backup manager: named, timestamped snapshots under a backup namespace.
//!
//! Layout inside the backup bucket:
//!
//! ```text
//! current/content.json          current/<lang>.md
//! current/images/<file>         current/theme/<file>       current/favicon/<file>
//! backups/<label>__<timestamp>/ (same sub-layout as current/)
//! ```
//!
//! Restore replaces `current/` with a copy of a backup's contents; the
//! backup itself is never consumed. A safety backup of `current/` is taken
//! inside [`BackupManager::restore`] before anything is deleted.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::codec;
use crate::content::Content;
use crate::error::{Result, SiteError};
use crate::reconcile::Reconciler;
use crate::store::{copy_path, delete_path, StorageClient};
use crate::theme::Theme;

/// Prefix of the live editable namespace.
pub const CURRENT_PREFIX: &str = "current/";

/// Prefix all backup folders live under.
pub const BACKUP_PREFIX: &str = "backups/";

/// Sub-prefix for image artifacts.
pub const IMAGE_PREFIX: &str = "images/";

/// Sub-prefix for theme template sources.
pub const THEME_PREFIX: &str = "theme/";

/// Sub-prefix for favicon artifacts.
pub const FAVICON_PREFIX: &str = "favicon/";

/// Separator between a backup label and its timestamp.
pub const DATE_SEPARATOR: &str = "__";

const DEFAULT_LABEL: &str = "unnamed";
const RESTORE_SAFETY_LABEL: &str = "before-restore";

/// Build a backup folder name from a label, at an explicit instant.
///
/// Blank labels fall back to a fixed placeholder. Labels containing the
/// separator are rejected: they would corrupt the timestamp-suffix sort.
pub fn folder_name_at(label: &str, now: DateTime<Utc>) -> Result<String> {
    let label = label.trim();
    let label = if label.is_empty() { DEFAULT_LABEL } else { label };
    if label.contains(DATE_SEPARATOR) {
        return Err(SiteError::validation(format!(
            "backup name must not contain \"{DATE_SEPARATOR}\""
        )));
    }
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    Ok(format!("{label}{DATE_SEPARATOR}{timestamp}"))
}

/// Sort backup folder names reverse-chronologically.
///
/// The sort key is the trailing timestamp token (text after the last
/// separator); full-name lexicographic order breaks ties so names without
/// a parseable timestamp still sort stably.
pub fn sort_backups(mut folders: Vec<String>) -> Vec<String> {
    fn key(name: &str) -> (&str, &str) {
        let timestamp = name
            .rsplit_once(DATE_SEPARATOR)
            .map(|(_, ts)| ts)
            .unwrap_or(name);
        (timestamp, name)
    }
    folders.sort_by(|a, b| key(b).cmp(&key(a)));
    folders
}

/// Manages snapshots of content + theme under the backup bucket.
pub struct BackupManager {
    client: Arc<dyn StorageClient>,
    reconciler: Reconciler,
    bucket: String,
}

impl BackupManager {
    /// Create a manager over an explicitly passed storage handle.
    pub fn new(client: Arc<dyn StorageClient>, bucket: impl Into<String>) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&client)),
            client,
            bucket: bucket.into(),
        }
    }

    /// The backup bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Persist content + theme under `prefix`, mirroring each artifact
    /// group into its own sub-prefix.
    ///
    /// The four group reconciles run concurrently; a failure in any group
    /// fails the save (already-finished groups stay written).
    pub async fn save_at(&self, prefix: &str, content: &Content, theme: &Theme) -> Result<()> {
        let content_files = codec::encode(content)?;
        let theme_files = theme.encode_files();
        let images = content.all_images();
        let favicons = theme.all_favicons();

        futures_util::future::try_join4(
            self.reconciler.reconcile(&self.bucket, prefix, &content_files),
            self.reconciler.reconcile(
                &self.bucket,
                &format!("{prefix}{IMAGE_PREFIX}"),
                &images,
            ),
            self.reconciler.reconcile(
                &self.bucket,
                &format!("{prefix}{THEME_PREFIX}"),
                &theme_files,
            ),
            self.reconciler.reconcile(
                &self.bucket,
                &format!("{prefix}{FAVICON_PREFIX}"),
                &favicons,
            ),
        )
        .await?;
        Ok(())
    }

    /// Persist content + theme into the live `current/` namespace.
    pub async fn save_current(&self, content: &Content, theme: &Theme) -> Result<()> {
        self.save_at(CURRENT_PREFIX, content, theme).await
    }

    /// Create a new timestamped backup; returns its folder name.
    ///
    /// The caller prepends the returned name to its newest-first list.
    pub async fn create(&self, label: &str, content: &Content, theme: &Theme) -> Result<String> {
        let folder = folder_name_at(label, Utc::now())?;
        log::info!("creating backup {folder}");
        self.save_at(&format!("{BACKUP_PREFIX}{folder}/"), content, theme)
            .await?;
        Ok(folder)
    }

    /// Delete every object under `backups/<folder>/`.
    pub async fn delete(&self, folder: &str) -> Result<()> {
        log::info!("deleting backup {folder}");
        delete_path(
            self.client.as_ref(),
            &self.bucket,
            &format!("{BACKUP_PREFIX}{folder}/"),
        )
        .await
    }

    /// Replace `current/` with a copy of `backups/<folder>/`.
    ///
    /// A safety backup of the live namespace is copied aside first, so a
    /// mistaken restore is always recoverable. Returns the safety backup's
    /// folder name. The restored backup itself is left untouched.
    pub async fn restore(&self, folder: &str) -> Result<String> {
        let client = self.client.as_ref();
        let from_prefix = format!("{BACKUP_PREFIX}{folder}/");

        let safety = folder_name_at(RESTORE_SAFETY_LABEL, Utc::now())?;
        log::info!("restoring backup {folder} (safety backup: {safety})");
        copy_path(
            client,
            &self.bucket,
            CURRENT_PREFIX,
            &format!("{BACKUP_PREFIX}{safety}/"),
        )
        .await?;

        delete_path(client, &self.bucket, CURRENT_PREFIX).await?;
        copy_path(client, &self.bucket, &from_prefix, CURRENT_PREFIX).await?;
        Ok(safety)
    }

    /// List backup folder names, newest first.
    pub async fn list(&self) -> Result<Vec<String>> {
        let folders = self.client.list_folders(&self.bucket, BACKUP_PREFIX).await?;
        Ok(sort_backups(folders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{block_on_test, InMemoryStore};
    use chrono::TimeZone;

    fn sample() -> (Content, Theme) {
        let mut content = Content::default();
        content.add_translation("en").unwrap();
        content.translations[0].markdown = "# hi".to_string();
        let theme = Theme {
            files: vec![crate::theme::ThemeFile::new("main.html", "<html/>")],
            ..Theme::default()
        };
        (content, theme)
    }

    fn manager(store: &Arc<InMemoryStore>) -> BackupManager {
        BackupManager::new(Arc::clone(store) as Arc<dyn StorageClient>, "backup-bucket")
    }

    #[test]
    fn test_folder_name_defaults_blank_label() {
        let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let name = folder_name_at("  ", now).unwrap();
        assert_eq!(name, "unnamed__2023-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_folder_name_rejects_separator_in_label() {
        let err = folder_name_at("a__b", Utc::now()).unwrap_err();
        assert!(matches!(err, SiteError::Validation(_)));
    }

    #[test]
    fn test_backups_sorted_by_timestamp_suffix_descending() {
        let sorted = sort_backups(vec![
            "a__2023-01-01T00:00:00Z".to_string(),
            "b__2023-06-01T00:00:00Z".to_string(),
        ]);
        assert_eq!(
            sorted,
            vec!["b__2023-06-01T00:00:00Z", "a__2023-01-01T00:00:00Z"]
        );
    }

    #[test]
    fn test_malformed_names_sort_stably() {
        let sorted = sort_backups(vec![
            "zzz".to_string(),
            "a__2024-01-01T00:00:00Z".to_string(),
            "aaa".to_string(),
        ]);
        assert_eq!(sorted, vec!["zzz", "aaa", "a__2024-01-01T00:00:00Z"]);
    }

    #[test]
    fn test_create_writes_backup_layout() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (content, theme) = sample();
            let folder = manager(&store).create("site", &content, &theme).await.unwrap();

            assert!(folder.starts_with("site__"));
            let keys = store.keys("backup-bucket");
            assert!(keys.contains(&format!("backups/{folder}/content.json")));
            assert!(keys.contains(&format!("backups/{folder}/en.md")));
            assert!(keys.contains(&format!("backups/{folder}/theme/main.html")));
        });
    }

    #[test]
    fn test_delete_removes_only_that_backup() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (content, theme) = sample();
            let manager = manager(&store);
            let first = manager.create("first", &content, &theme).await.unwrap();
            let second = manager.create("second", &content, &theme).await.unwrap();

            manager.delete(&first).await.unwrap();

            let keys = store.keys("backup-bucket");
            assert!(!keys.iter().any(|k| k.contains(&first)));
            assert!(keys.iter().any(|k| k.contains(&second)));
        });
    }

    #[test]
    fn test_restore_mirrors_backup_into_current() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (mut content, theme) = sample();
            let manager = manager(&store);

            manager.save_current(&content, &theme).await.unwrap();
            let folder = manager.create("snap", &content, &theme).await.unwrap();

            // diverge current, then restore
            content.translations[0].markdown = "# changed".to_string();
            manager.save_current(&content, &theme).await.unwrap();
            let safety = manager.restore(&folder).await.unwrap();

            let restored = store.get("backup-bucket", "current/en.md").await.unwrap();
            assert_eq!(restored.bytes, b"# hi");

            // the backup itself is untouched, and the pre-restore state is
            // preserved under the safety folder
            let backup_copy = store
                .get("backup-bucket", &format!("backups/{folder}/en.md"))
                .await
                .unwrap();
            assert_eq!(backup_copy.bytes, b"# hi");
            let safety_copy = store
                .get("backup-bucket", &format!("backups/{safety}/en.md"))
                .await
                .unwrap();
            assert_eq!(safety_copy.bytes, b"# changed");
            assert!(safety.starts_with("before-restore__"));
        });
    }

    #[test]
    fn test_list_is_newest_first() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            store
                .put(
                    "backup-bucket",
                    "backups/a__2023-01-01T00:00:00.000Z/content.json",
                    b"{}".to_vec(),
                    "application/json",
                )
                .await
                .unwrap();
            store
                .put(
                    "backup-bucket",
                    "backups/b__2023-06-01T00:00:00.000Z/content.json",
                    b"{}".to_vec(),
                    "application/json",
                )
                .await
                .unwrap();

            let folders = manager(&store).list().await.unwrap();
            assert_eq!(
                folders,
                vec![
                    "b__2023-06-01T00:00:00.000Z",
                    "a__2023-01-01T00:00:00.000Z"
                ]
            );
        });
    }
}
