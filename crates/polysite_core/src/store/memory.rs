//! In-memory object store.
//!
//! Backs tests and offline usage. Counts issued put/delete operations so
//! reconcile idempotence and minimality are observable.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, SiteError};

use super::{content_fingerprint, BoxFuture, RemoteObject, StorageClient, StoredObject};

#[derive(Debug, Clone)]
struct Entry {
    bytes: Vec<u8>,
    content_type: String,
}

/// An in-memory [`StorageClient`] over a mutexed key space.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<(String, String), Entry>>,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of put operations issued so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of delete operations issued so far (batch deletes count each
    /// key).
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Reset the operation counters.
    pub fn reset_counts(&self) {
        self.puts.store(0, Ordering::SeqCst);
        self.deletes.store(0, Ordering::SeqCst);
    }

    /// All keys in `bucket`, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .expect("store mutex poisoned")
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), Entry>> {
        self.objects.lock().expect("store mutex poisoned")
    }

    fn remote(key: &str, entry: &Entry) -> RemoteObject {
        RemoteObject {
            key: key.to_string(),
            size: entry.bytes.len() as u64,
            fingerprint: content_fingerprint(&entry.bytes),
        }
    }
}

impl StorageClient for InMemoryStore {
    fn list<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteObject>>> {
        Box::pin(async move {
            let objects = self.lock();
            Ok(objects
                .iter()
                .filter(|((b, k), _)| {
                    b == bucket
                        && k.starts_with(prefix)
                        && !k[prefix.len()..].contains('/')
                })
                .map(|((_, k), entry)| Self::remote(k, entry))
                .collect())
        })
    }

    fn list_all<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteObject>>> {
        Box::pin(async move {
            let objects = self.lock();
            Ok(objects
                .iter()
                .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
                .map(|((_, k), entry)| Self::remote(k, entry))
                .collect())
        })
    }

    fn list_folders<'a>(
        &'a self,
        bucket: &'a str,
        prefix: &'a str,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let objects = self.lock();
            let mut folders = Vec::new();
            for (b, k) in objects.keys() {
                if b != bucket || !k.starts_with(prefix) {
                    continue;
                }
                if let Some((folder, _)) = k[prefix.len()..].split_once('/') {
                    if !folder.is_empty() && !folders.iter().any(|f| f == folder) {
                        folders.push(folder.to_string());
                    }
                }
            }
            Ok(folders)
        })
    }

    fn get<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<StoredObject>> {
        Box::pin(async move {
            let objects = self.lock();
            let entry = objects
                .get(&(bucket.to_string(), key.to_string()))
                .ok_or_else(|| SiteError::storage(format!("no such key: {bucket}/{key}")))?;
            Ok(StoredObject {
                bytes: entry.bytes.clone(),
                content_type: entry.content_type.clone(),
                fingerprint: content_fingerprint(&entry.bytes),
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
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.lock().insert(
                (bucket.to_string(), key.to_string()),
                Entry {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );
            Ok(())
        })
    }

    fn delete<'a>(&'a self, bucket: &'a str, key: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.lock().remove(&(bucket.to_string(), key.to_string()));
            Ok(())
        })
    }

    fn delete_many<'a>(&'a self, bucket: &'a str, keys: Vec<String>) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut objects = self.lock();
            for key in keys {
                self.deletes.fetch_add(1, Ordering::SeqCst);
                objects.remove(&(bucket.to_string(), key));
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
            let mut objects = self.lock();
            let entry = objects
                .get(&(bucket.to_string(), from_key.to_string()))
                .cloned()
                .ok_or_else(|| {
                    SiteError::storage(format!("no such key: {bucket}/{from_key}"))
                })?;
            objects.insert((bucket.to_string(), to_key.to_string()), entry);
            Ok(())
        })
    }
}
