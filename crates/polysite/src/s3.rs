//! S3 storage client.
//!
//! Objects are written with their content fingerprint attached as metadata
//! (`x-amz-meta-fingerprint`), because S3 listings cannot report a SHA-256
//! on their own. Non-recursive listings resolve that metadata with one
//! concurrent head request per object; objects uploaded by other tools have
//! no fingerprint and simply get re-uploaded on the next reconcile.

use aws_config::BehaviorVersion;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;

use polysite_core::config::SiteConfig;
use polysite_core::error::{Result, SiteError};
use polysite_core::store::{
    content_fingerprint, BoxFuture, RemoteObject, StorageClient, StoredObject,
};

const FINGERPRINT_METADATA_KEY: &str = "fingerprint";

/// [`StorageClient`] backed by an S3-compatible object store.
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Connect using the configured region/endpoint and the default AWS
    /// credential chain (environment, profile, instance role).
    pub async fn connect(config: &SiteConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            // Path-style addressing for MinIO and friends
            builder = builder.endpoint_url(endpoint).force_path_style(true);
            log::debug!("using custom endpoint {endpoint}");
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
        token: Option<String>,
    ) -> Result<aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(token);
        if let Some(delimiter) = delimiter {
            request = request.delimiter(delimiter);
        }
        request
            .send()
            .await
            .map_err(|e| SiteError::storage(format!("list {bucket}/{prefix} failed: {e}")))
    }

    async fn head_fingerprint(&self, bucket: &str, key: &str) -> Result<String> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| SiteError::storage(format!("head {bucket}/{key} failed: {e}")))?;
        Ok(head
            .metadata()
            .and_then(|m| m.get(FINGERPRINT_METADATA_KEY))
            .cloned()
            .unwrap_or_default())
    }
}

impl StorageClient for S3Store {
    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteObject>>> {
        Box::pin(async move {
            let mut objects: Vec<(String, u64)> = Vec::new();
            let mut token = None;
            loop {
                let page = self.list_page(bucket, prefix, Some("/"), token).await?;
                for object in page.contents() {
                    if let Some(key) = object.key() {
                        objects.push((key.to_string(), object.size().unwrap_or(0) as u64));
                    }
                }
                match page.next_continuation_token() {
                    Some(next) => token = Some(next.to_string()),
                    None => break,
                }
            }

            let resolved = objects.into_iter().map(|(key, size)| async move {
                let fingerprint = self.head_fingerprint(bucket, &key).await?;
                Ok(RemoteObject {
                    key,
                    size,
                    fingerprint,
                })
            });
            futures_util::future::try_join_all(resolved).await
        })
    }

    fn list_all<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteObject>>> {
        Box::pin(async move {
            // Recursive listings feed whole-path copy/delete, which never
            // compare fingerprints, so the head requests are skipped.
            let mut objects = Vec::new();
            let mut token = None;
            loop {
                let page = self.list_page(bucket, prefix, None, token).await?;
                for object in page.contents() {
                    if let Some(key) = object.key() {
                        objects.push(RemoteObject {
                            key: key.to_string(),
                            size: object.size().unwrap_or(0) as u64,
                            fingerprint: String::new(),
                        });
                    }
                }
                match page.next_continuation_token() {
                    Some(next) => token = Some(next.to_string()),
                    None => break,
                }
            }
            Ok(objects)
        })
    }

    fn list_folders<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let mut folders = Vec::new();
            let mut token = None;
            loop {
                let page = self.list_page(bucket, prefix, Some("/"), token).await?;
                for common in page.common_prefixes() {
                    if let Some(p) = common.prefix() {
                        let name = p
                            .strip_prefix(prefix)
                            .unwrap_or(p)
                            .trim_end_matches('/')
                            .to_string();
                        if !name.is_empty() {
                            folders.push(name);
                        }
                    }
                }
                match page.next_continuation_token() {
                    Some(next) => token = Some(next.to_string()),
                    None => break,
                }
            }
            Ok(folders)
        })
    }

    fn get<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<StoredObject>> {
        Box::pin(async move {
            let response = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| SiteError::storage(format!("get {bucket}/{key} failed: {e}")))?;

            let content_type = response.content_type().unwrap_or_default().to_string();
            let fingerprint = response
                .metadata()
                .and_then(|m| m.get(FINGERPRINT_METADATA_KEY))
                .cloned();
            let bytes = response
                .body
                .collect()
                .await
                .map_err(|e| SiteError::storage(format!("read {bucket}/{key} failed: {e}")))?
                .into_bytes()
                .to_vec();

            let fingerprint = fingerprint.unwrap_or_else(|| content_fingerprint(&bytes));
            Ok(StoredObject {
                bytes,
                content_type,
                fingerprint,
            })
        })
    }

    fn put<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let fingerprint = content_fingerprint(&bytes);
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type(content_type)
                .metadata(FINGERPRINT_METADATA_KEY, fingerprint)
                .body(ByteStream::from(bytes))
                .send()
                .await
                .map_err(|e| SiteError::storage(format!("put {bucket}/{key} failed: {e}")))?;
            Ok(())
        })
    }

    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| SiteError::storage(format!("delete {bucket}/{key} failed: {e}")))?;
            Ok(())
        })
    }

    fn delete_many<'a>(&'a self, bucket: &'a str, keys: Vec<String>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            // S3 caps batch deletes at 1000 keys
            for chunk in keys.chunks(1000) {
                let mut identifiers = Vec::with_capacity(chunk.len());
                for key in chunk {
                    identifiers.push(
                        ObjectIdentifier::builder()
                            .key(key)
                            .build()
                            .map_err(|e| SiteError::storage(format!("bad delete key: {e}")))?,
                    );
                }
                let delete = Delete::builder()
                    .set_objects(Some(identifiers))
                    .build()
                    .map_err(|e| SiteError::storage(format!("bad delete batch: {e}")))?;
                self.client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| {
                        SiteError::storage(format!("batch delete in {bucket} failed: {e}"))
                    })?;
            }
            Ok(())
        })
    }

    fn copy<'a>(
        &'a self,
        bucket: &'a str,
        from_key: &'a str,
        to_key: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.client
                .copy_object()
                .bucket(bucket)
                .copy_source(format!("{bucket}/{from_key}"))
                .key(to_key)
                .metadata_directive(aws_sdk_s3::types::MetadataDirective::Copy)
                .send()
                .await
                .map_err(|e| {
                    SiteError::storage(format!(
                        "copy {bucket}/{from_key} -> {to_key} failed: {e}"
                    ))
                })?;
            Ok(())
        })
    }
}
