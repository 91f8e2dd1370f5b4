//! Bucket discovery: enumerate every mission definition object.
//!
//! Storage folders carry no listing metadata, so traversal is structural:
//! entries without file metadata are folders and are descended into
//! depth-first, leaves ending in `.json` are collected. Traversal order only
//! affects the order files are later reconciled in, not correctness.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::contract::{BackendError, StorageProvider};

/// Recursively lists `bucket` under `prefix` and returns the path of every
/// object whose name ends in `.json`.
///
/// Any listing failure aborts discovery: without a complete manifest no
/// reconciliation can proceed.
pub async fn list_json_objects<S>(
    storage: &S,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, BackendError>
where
    S: StorageProvider + ?Sized,
{
    let mut found = Vec::new();
    walk(storage, bucket, prefix.to_string(), &mut found).await?;
    debug!(bucket = %bucket, files = found.len(), "Discovery finished");
    Ok(found)
}

// Boxed because async recursion has no finite future size.
fn walk<'a, S>(
    storage: &'a S,
    bucket: &'a str,
    prefix: String,
    found: &'a mut Vec<String>,
) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>>
where
    S: StorageProvider + ?Sized,
{
    Box::pin(async move {
        let entries = storage.list(bucket, &prefix).await?;
        debug!(bucket = %bucket, prefix = %prefix, entries = entries.len(), "Listed storage folder");
        for entry in entries {
            let path = join_path(&prefix, &entry.name);
            if entry.is_file() {
                if entry.name.ends_with(".json") {
                    found.push(path);
                }
            } else {
                walk(storage, bucket, path, found).await?;
            }
        }
        Ok(())
    })
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
