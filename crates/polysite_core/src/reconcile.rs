//! Storage reconciler: make a remote prefix exactly mirror a desired
//! artifact set with minimal operations.
//!
//! The diff is fingerprint-based, never timestamp-based: re-uploading
//! identical bytes under clock skew must stay a no-op. This
//! "list, diff by fingerprint, put changed, delete orphaned" protocol is
//! reused for every persistence target (live site, current save namespace,
//! each backup namespace).

use std::sync::Arc;

use crate::artifact::Artifact;
use crate::error::Result;
use crate::store::{BoxFuture, RemoteObject, StorageClient};

/// A desired artifact resolved against a target prefix.
#[derive(Debug)]
pub struct DesiredEntry<'a> {
    /// Full object key (`prefix + artifact.name`)
    pub key: String,
    /// Fingerprint the store would report for these bytes
    pub fingerprint: String,
    /// The artifact to upload when the entry is stale
    pub artifact: &'a Artifact,
}

/// The minimal operation set produced by [`plan`].
#[derive(Debug, Default)]
pub struct ReconcilePlan<'a> {
    /// Entries to upload (missing remotely, or fingerprint differs)
    pub puts: Vec<DesiredEntry<'a>>,
    /// Remote keys with no desired counterpart
    pub deletes: Vec<String>,
}

impl ReconcilePlan<'_> {
    /// True when remote state already matches the desired set.
    pub fn is_empty(&self) -> bool {
        self.puts.is_empty() && self.deletes.is_empty()
    }
}

/// Diff a remote listing against a desired artifact set.
///
/// Directory placeholder keys (zero size or trailing slash) are excluded
/// from all comparisons. Exactly the stale/missing entries become puts and
/// exactly the orphaned remote keys become deletes; nothing else is touched.
pub fn plan<'a>(remote: &[RemoteObject], desired: Vec<DesiredEntry<'a>>) -> ReconcilePlan<'a> {
    let remote: Vec<&RemoteObject> = remote
        .iter()
        .filter(|o| o.size > 0 && !o.key.ends_with('/'))
        .collect();

    let desired_keys: Vec<&str> = desired.iter().map(|e| e.key.as_str()).collect();
    let deletes = remote
        .iter()
        .filter(|o| !desired_keys.contains(&o.key.as_str()))
        .map(|o| o.key.clone())
        .collect();

    let mut puts = Vec::new();
    for entry in desired {
        match remote.iter().find(|o| o.key == entry.key) {
            Some(existing) if existing.fingerprint == entry.fingerprint => {}
            _ => puts.push(entry),
        }
    }

    ReconcilePlan { puts, deletes }
}

/// Applies [`ReconcilePlan`]s against a storage client.
pub struct Reconciler {
    client: Arc<dyn StorageClient>,
}

impl Reconciler {
    /// Create a reconciler over an explicitly passed storage handle.
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    /// Make `bucket`/`prefix` exactly mirror `desired`.
    ///
    /// All puts and deletes run concurrently; the call resolves once every
    /// operation completes and fails fast if any one fails. Partial writes
    /// are not rolled back; re-invoking is safe because unchanged artifacts
    /// are skipped by fingerprint.
    pub async fn reconcile(
        &self,
        bucket: &str,
        prefix: &str,
        desired: &[Artifact],
    ) -> Result<()> {
        let remote = self.client.list(bucket, prefix).await?;

        let entries: Vec<DesiredEntry<'_>> = desired
            .iter()
            .map(|artifact| DesiredEntry {
                key: format!("{prefix}{}", artifact.name),
                fingerprint: artifact
                    .fingerprint
                    .clone()
                    .unwrap_or_else(|| self.client.fingerprint(&artifact.content)),
                artifact,
            })
            .collect();

        let plan = plan(&remote, entries);
        log::info!(
            "reconcile {bucket}/{prefix}: {} puts, {} deletes, {} unchanged",
            plan.puts.len(),
            plan.deletes.len(),
            desired.len() - plan.puts.len(),
        );
        if plan.is_empty() {
            return Ok(());
        }

        let mut ops: Vec<BoxFuture<'_, Result<()>>> = Vec::new();
        for entry in &plan.puts {
            ops.push(self.client.put(
                bucket,
                &entry.key,
                entry.artifact.content.clone(),
                &entry.artifact.content_type,
            ));
        }
        for key in &plan.deletes {
            ops.push(self.client.delete(bucket, key));
        }
        futures_util::future::try_join_all(ops).await?;
        Ok(())
    }
}
