//! Editing session: load, save, deploy and export a site as one unit.
//!
//! A [`Session`] ties the backup bucket (editable state) and the website
//! bucket (rendered state) together behind the operations a front end
//! needs. Long-running operations report progress through a
//! [`StatusCallback`] so callers can surface phase changes without polling.

use std::fmt;
use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::artifact::Artifact;
use crate::backup::{BackupManager, CURRENT_PREFIX, FAVICON_PREFIX, IMAGE_PREFIX, THEME_PREFIX};
use crate::codec;
use crate::content::Content;
use crate::error::Result;
use crate::reconcile::Reconciler;
use crate::render::{render_site, MarkdownRenderer, StyleCompiler, TemplateEngine};
use crate::store::{get_files, StorageClient};
use crate::theme::Theme;

/// Phase of a session operation, reported through [`StatusCallback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Encoding and rendering artifacts
    GeneratingFiles,
    /// Reconciling artifacts against remote storage
    Uploading,
    /// Building the export archive
    GeneratingZip,
    /// Save finished
    Saved,
    /// Deploy finished
    Deployed,
    /// Operation failed; carries the reason
    Failure(String),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::GeneratingFiles => write!(f, "Generating Files"),
            SessionStatus::Uploading => write!(f, "Uploading"),
            SessionStatus::GeneratingZip => write!(f, "Generating Zip"),
            SessionStatus::Saved => write!(f, "Saved!"),
            SessionStatus::Deployed => write!(f, "Deployed!"),
            SessionStatus::Failure(reason) => write!(f, "Failure: {reason}"),
        }
    }
}

/// Callback type for status reporting.
pub type StatusCallback<'a> = &'a (dyn Fn(SessionStatus) + Send + Sync);

/// A no-op status callback for callers that do not report progress.
pub fn no_status() -> StatusCallback<'static> {
    &|_| {}
}

/// Everything a front end needs after loading a site.
#[derive(Debug)]
pub struct LoadedSite {
    /// Decoded editable content
    pub content: Content,
    /// Decoded theme sources plus persisted favicons
    pub theme: Theme,
    /// Backup folder names, newest first
    pub backups: Vec<String>,
}

/// An editing session over one website/backup bucket pair.
pub struct Session {
    client: Arc<dyn StorageClient>,
    reconciler: Reconciler,
    backups: BackupManager,
    website_bucket: String,
    site_title: String,
}

impl Session {
    /// Create a session over an explicitly passed storage handle.
    pub fn new(
        client: Arc<dyn StorageClient>,
        website_bucket: impl Into<String>,
        backup_bucket: impl Into<String>,
        site_title: impl Into<String>,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(Arc::clone(&client)),
            backups: BackupManager::new(Arc::clone(&client), backup_bucket),
            client,
            website_bucket: website_bucket.into(),
            site_title: site_title.into(),
        }
    }

    /// The backup manager bound to this session's backup bucket.
    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Load the editable state and the backup list.
    ///
    /// All five fetches (content, images, theme, favicons, backup list)
    /// run concurrently.
    pub async fn load(&self) -> Result<LoadedSite> {
        let client = self.client.as_ref();
        let bucket = self.backups.bucket();
        let (content_files, images, theme_files, favicons, backups) =
            futures_util::future::try_join5(
                get_files(client, bucket, CURRENT_PREFIX),
                get_files(client, bucket, &format!("{CURRENT_PREFIX}{IMAGE_PREFIX}")),
                get_files(client, bucket, &format!("{CURRENT_PREFIX}{THEME_PREFIX}")),
                get_files(client, bucket, &format!("{CURRENT_PREFIX}{FAVICON_PREFIX}")),
                self.backups.list(),
            )
            .await?;

        let mut content = codec::decode(&content_files)?;
        content.initial_images = images;
        let theme = Theme::decode(&theme_files, favicons)?;
        log::info!(
            "loaded site: {} translations, {} backups",
            content.translations.len(),
            backups.len(),
        );
        Ok(LoadedSite {
            content,
            theme,
            backups,
        })
    }

    /// Persist the editable state into `current/`.
    pub async fn save(
        &self,
        content: &Content,
        theme: &Theme,
        on_status: StatusCallback<'_>,
    ) -> Result<()> {
        on_status(SessionStatus::GeneratingFiles);
        on_status(SessionStatus::Uploading);
        let result = self.backups.save_current(content, theme).await;
        report(result, SessionStatus::Saved, on_status)
    }

    /// Save, render and publish the live site.
    ///
    /// The website bucket root receives `index.html`, `index.css` and the
    /// favicons; images mirror into its `images/` prefix. The root
    /// reconcile lists non-recursively, so it never touches the image
    /// namespace.
    pub async fn deploy(
        &self,
        content: &Content,
        theme: &Theme,
        markdown: &dyn MarkdownRenderer,
        engine: &dyn TemplateEngine,
        styles: &dyn StyleCompiler,
        on_status: StatusCallback<'_>,
    ) -> Result<()> {
        on_status(SessionStatus::GeneratingFiles);
        let result = self
            .deploy_inner(content, theme, markdown, engine, styles, on_status)
            .await;
        report(result, SessionStatus::Deployed, on_status)
    }

    async fn deploy_inner(
        &self,
        content: &Content,
        theme: &Theme,
        markdown: &dyn MarkdownRenderer,
        engine: &dyn TemplateEngine,
        styles: &dyn StyleCompiler,
        on_status: StatusCallback<'_>,
    ) -> Result<()> {
        let mut site_files = render_site(theme, content, markdown, engine, styles)?;
        site_files.extend(theme.all_favicons());
        let images = content.all_images();

        on_status(SessionStatus::Uploading);
        self.backups.save_current(content, theme).await?;
        futures_util::future::try_join(
            self.reconciler.reconcile(&self.website_bucket, "", &site_files),
            self.reconciler
                .reconcile(&self.website_bucket, IMAGE_PREFIX, &images),
        )
        .await?;
        Ok(())
    }

    /// Render the site into a downloadable zip archive.
    ///
    /// The archive mirrors the live site layout (`index.html`, `index.css`
    /// and favicons at the root, images under `images/`) and is named
    /// `<title>-<timestamp>.zip`.
    pub async fn download(
        &self,
        content: &Content,
        theme: &Theme,
        markdown: &dyn MarkdownRenderer,
        engine: &dyn TemplateEngine,
        styles: &dyn StyleCompiler,
        on_status: StatusCallback<'_>,
    ) -> Result<Artifact> {
        on_status(SessionStatus::GeneratingFiles);
        let result = self.build_archive(content, theme, markdown, engine, styles, on_status);
        report(result, SessionStatus::Saved, on_status)
    }

    fn build_archive(
        &self,
        content: &Content,
        theme: &Theme,
        markdown: &dyn MarkdownRenderer,
        engine: &dyn TemplateEngine,
        styles: &dyn StyleCompiler,
        on_status: StatusCallback<'_>,
    ) -> Result<Artifact> {
        let mut site_files = render_site(theme, content, markdown, engine, styles)?;
        site_files.extend(theme.all_favicons());

        on_status(SessionStatus::GeneratingZip);
        let mut buffer = Vec::new();
        {
            let mut archive = ZipWriter::new(Cursor::new(&mut buffer));
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
            for artifact in &site_files {
                archive.start_file(artifact.name.as_str(), options)?;
                archive.write_all(&artifact.content)?;
            }
            for image in content.all_images() {
                archive.start_file(format!("{IMAGE_PREFIX}{}", image.name), options)?;
                archive.write_all(&image.content)?;
            }
            archive.finish()?;
        }

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let name = format!("{}-{timestamp}.zip", self.site_title);
        Ok(Artifact::binary(name, buffer, "application/zip"))
    }
}

fn report<T>(
    result: Result<T>,
    done: SessionStatus,
    on_status: StatusCallback<'_>,
) -> Result<T> {
    match &result {
        Ok(_) => on_status(done),
        Err(e) => on_status(SessionStatus::Failure(e.to_string())),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteError;
    use crate::render::CompileOutput;
    use crate::store::{block_on_test, InMemoryStore};
    use std::sync::Mutex;

    struct PlainMarkdown;

    impl MarkdownRenderer for PlainMarkdown {
        fn to_html(&self, markdown: &str) -> String {
            format!("<p>{markdown}</p>")
        }
    }

    struct FixedCompiler(i32, &'static str);

    impl StyleCompiler for FixedCompiler {
        fn compile(&self, _source: &str) -> Result<CompileOutput> {
            Ok(CompileOutput {
                status: self.0,
                text: self.1.to_string(),
            })
        }
    }

    fn sample() -> (Content, Theme) {
        let mut content = Content::default();
        content.add_translation("en").unwrap();
        content.translations[0].markdown = "# welcome".to_string();
        content
            .apply_image_op(crate::content::ImageOp::Add(Artifact::binary(
                "photo.png",
                vec![1, 2, 3],
                "image/png",
            )))
            .unwrap();
        let theme = Theme {
            files: vec![
                crate::theme::ThemeFile::new("main.html", "<html>{{json.translations}}</html>"),
                crate::theme::ThemeFile::new("style.theme.scss", "$x: 1;"),
            ],
            ..Theme::default()
        };
        (content, theme)
    }

    fn session(store: &Arc<InMemoryStore>) -> Session {
        Session::new(
            Arc::clone(store) as Arc<dyn StorageClient>,
            "website-bucket",
            "backup-bucket",
            "My Site",
        )
    }

    fn recording() -> (Arc<Mutex<Vec<String>>>, impl Fn(SessionStatus) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |status: SessionStatus| {
            sink.lock().unwrap().push(status.to_string());
        })
    }

    #[test]
    fn test_save_then_load_round_trips() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let session = session(&store);
            let (content, theme) = sample();

            session.save(&content, &theme, no_status()).await.unwrap();
            let loaded = session.load().await.unwrap();

            assert_eq!(loaded.content.translations.len(), 1);
            assert_eq!(loaded.content.translations[0].markdown, "# welcome");
            assert_eq!(loaded.content.initial_images.len(), 1);
            assert_eq!(loaded.content.initial_images[0].name, "photo.png");
            assert_eq!(loaded.theme.files.len(), 2);
            assert!(loaded.backups.is_empty());
        });
    }

    #[test]
    fn test_save_reports_statuses_in_order() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (content, theme) = sample();
            let (seen, on_status) = recording();

            session(&store).save(&content, &theme, &on_status).await.unwrap();

            assert_eq!(
                *seen.lock().unwrap(),
                vec!["Generating Files", "Uploading", "Saved!"]
            );
        });
    }

    #[test]
    fn test_deploy_publishes_live_layout() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let session = session(&store);
            let (content, theme) = sample();
            let (seen, on_status) = recording();

            session
                .deploy(
                    &content,
                    &theme,
                    &PlainMarkdown,
                    &crate::template::Renderer,
                    &FixedCompiler(0, "body{}"),
                    &on_status,
                )
                .await
                .unwrap();

            let keys = store.keys("website-bucket");
            assert_eq!(keys, vec!["images/photo.png", "index.css", "index.html"]);
            // the editable state is saved as part of the deploy
            assert!(store
                .keys("backup-bucket")
                .contains(&"current/content.json".to_string()));
            assert_eq!(seen.lock().unwrap().last().unwrap(), "Deployed!");
        });
    }

    #[test]
    fn test_redeploy_keeps_unchanged_images() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let session = session(&store);
            let (content, theme) = sample();

            let deploy = async |content: &Content, theme: &Theme| {
                session
                    .deploy(
                        content,
                        theme,
                        &PlainMarkdown,
                        &crate::template::Renderer,
                        &FixedCompiler(0, "body{}"),
                        no_status(),
                    )
                    .await
            };
            deploy(&content, &theme).await.unwrap();
            store.reset_counts();
            deploy(&content, &theme).await.unwrap();

            // identical state: the second deploy must be a storage no-op
            assert_eq!(store.put_count(), 0);
            assert_eq!(store.delete_count(), 0);
        });
    }

    #[test]
    fn test_deploy_failure_reports_reason() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (content, theme) = sample();
            let (seen, on_status) = recording();

            let err = session(&store)
                .deploy(
                    &content,
                    &theme,
                    &PlainMarkdown,
                    &crate::template::Renderer,
                    &FixedCompiler(65, "undefined variable"),
                    &on_status,
                )
                .await
                .unwrap_err();

            assert!(matches!(err, SiteError::TemplateCompile { status: 65, .. }));
            let seen = seen.lock().unwrap();
            assert!(seen.last().unwrap().starts_with("Failure: "));
            assert!(seen.last().unwrap().contains("undefined variable"));
            // nothing was published
            assert!(store.keys("website-bucket").is_empty());
        });
    }

    #[test]
    fn test_download_builds_live_site_archive() {
        block_on_test(async {
            let store = Arc::new(InMemoryStore::new());
            let (content, theme) = sample();

            let archive = session(&store)
                .download(
                    &content,
                    &theme,
                    &PlainMarkdown,
                    &crate::template::Renderer,
                    &FixedCompiler(0, "body{}"),
                    no_status(),
                )
                .await
                .unwrap();

            assert!(archive.name.starts_with("My Site-"));
            assert!(archive.name.ends_with(".zip"));
            assert_eq!(archive.content_type, "application/zip");
            // nothing was uploaded anywhere
            assert!(store.keys("website-bucket").is_empty());
            assert!(store.keys("backup-bucket").is_empty());

            let mut zip = zip::ZipArchive::new(Cursor::new(archive.content)).unwrap();
            let mut names: Vec<_> = (0..zip.len())
                .map(|i| zip.by_index(i).unwrap().name().to_string())
                .collect();
            names.sort();
            assert_eq!(names, vec!["images/photo.png", "index.css", "index.html"]);
        });
    }
}
