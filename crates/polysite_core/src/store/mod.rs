//! Storage abstraction module.
//!
//! [`StorageClient`] is the object-store collaborator consumed by the
//! reconciler, the backup manager and the session. It is an explicitly
//! passed handle; nothing in this crate configures a global client.
//!
//! ## Object safety
//!
//! `StorageClient` is designed to be object-safe so it can be used behind
//! `dyn StorageClient`. To enable this, all methods return boxed futures.

mod memory;

pub use memory::InMemoryStore;

use std::future::Future;
use std::pin::Pin;

use sha2::{Digest, Sha256};

use crate::artifact::Artifact;
use crate::error::Result;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with
/// multi-threaded runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Compute the content fingerprint: hex-encoded SHA-256.
///
/// This is the opaque equality token used to detect changed artifacts
/// without timestamps. Stores must report the same algorithm from
/// [`StorageClient::list`] so reconcile comparison is exact.
pub fn content_fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// A remote object as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Full object key (prefix included)
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Stored content fingerprint
    pub fingerprint: String,
}

/// A remote object fetched with its content.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Content bytes
    pub bytes: Vec<u8>,
    /// Stored MIME type
    pub content_type: String,
    /// Stored content fingerprint
    pub fingerprint: String,
}

/// Object-store collaborator.
///
/// All operations are scoped to a bucket; keys are `/`-separated paths.
pub trait StorageClient: Send + Sync {
    /// List objects directly under `prefix` (non-recursive).
    fn list<'a>(&'a self, bucket: &'a str, prefix: &'a str)
        -> BoxFuture<'a, Result<Vec<RemoteObject>>>;

    /// List every object under `prefix`, recursively.
    fn list_all<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteObject>>>;

    /// List the names of immediate sub-folders under `prefix`.
    fn list_folders<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>>>;

    /// Fetch one object.
    fn get<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<StoredObject>>;

    /// Upload one object.
    fn put<'a>(
        &'a self,
        bucket: &'a str,
        key: &'a str,
        bytes: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Delete one object.
    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Delete a batch of objects.
    fn delete_many<'a>(
        &'a self,
        bucket: &'a str,
        keys: Vec<String>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Server-side copy within the bucket.
    fn copy<'a>(
        &'a self,
        bucket: &'a str,
        from_key: &'a str,
        to_key: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    /// Fingerprint content the way this store does.
    ///
    /// The default is hex SHA-256; implementations over stores with a
    /// different native token (e.g. an MD5 ETag) must override this so
    /// local and remote fingerprints stay comparable.
    fn fingerprint(&self, content: &[u8]) -> String {
        content_fingerprint(content)
    }
}

/// Fetch every non-placeholder object directly under `prefix` as artifacts.
///
/// Artifact names are key basenames; stored fingerprints are carried over so
/// a later reconcile can skip unchanged files without re-hashing.
pub async fn get_files(
    client: &dyn StorageClient,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<Artifact>> {
    let objects = client.list(bucket, prefix).await?;
    let fetches = objects
        .into_iter()
        .filter(|o| o.size > 0 && !o.key.ends_with('/'))
        .map(|o| async move {
            let stored = client.get(bucket, &o.key).await?;
            let name = o.key.rsplit('/').next().unwrap_or(&o.key).to_string();
            Ok(Artifact::binary(name, stored.bytes, stored.content_type)
                .with_fingerprint(stored.fingerprint))
        });
    futures_util::future::try_join_all(fetches).await
}

/// Delete every object under `prefix`, recursively.
pub async fn delete_path(client: &dyn StorageClient, bucket: &str, prefix: &str) -> Result<()> {
    let objects = client.list_all(bucket, prefix).await?;
    if objects.is_empty() {
        return Ok(());
    }
    let keys = objects.into_iter().map(|o| o.key).collect();
    client.delete_many(bucket, keys).await
}

/// Copy every object under `from_prefix` to `to_prefix`, preserving
/// relative paths.
pub async fn copy_path(
    client: &dyn StorageClient,
    bucket: &str,
    from_prefix: &str,
    to_prefix: &str,
) -> Result<()> {
    let objects = client.list_all(bucket, from_prefix).await?;
    let copies = objects.into_iter().map(|o| {
        let relative = o
            .key
            .strip_prefix(from_prefix)
            .unwrap_or(&o.key)
            .to_string();
        let to_key = format!("{to_prefix}{relative}");
        async move { client.copy(bucket, &o.key, &to_key).await }
    });
    futures_util::future::try_join_all(copies).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn block_on_test<F: Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}
