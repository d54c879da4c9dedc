// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk cache of generated drawings, backed by cacache.
//!
//! Keys are SHA256 digests of an endpoint namespace plus the raw request
//! body. Entries older than the configured age are treated as missing and
//! removed by [`DiskCache::prune_expired`].

use crate::error::ApiError;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    max_age: Duration,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

impl DiskCache {
    /// Open (and create if needed) the cache directory.
    pub async fn open(dir: &str, max_age: Duration) -> Self {
        let dir = PathBuf::from(dir);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(error = %e, path = %dir.display(), "Cannot create cache directory");
        }
        Self { dir, max_age }
    }

    pub fn generate_key(namespace: &str, body: &[u8]) -> String {
        let digest = Sha256::new()
            .chain_update(namespace.as_bytes())
            .chain_update([0u8])
            .chain_update(body)
            .finalize();
        hex::encode(digest)
    }

    fn is_expired(&self, written_ms: u128) -> bool {
        now_millis().saturating_sub(written_ms) > self.max_age.as_millis()
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, ApiError> {
        let Some(entry) = cacache::metadata(&self.dir, key).await? else {
            return Ok(None);
        };
        if self.is_expired(entry.time) {
            tracing::debug!(key = %key, "Cache entry expired");
            return Ok(None);
        }
        match cacache::read_hash(&self.dir, &entry.integrity).await {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cache content missing");
                Ok(None)
            }
        }
    }

    pub async fn put_bytes(&self, key: &str, data: &[u8]) -> Result<(), ApiError> {
        cacache::write(&self.dir, key, data).await?;
        tracing::debug!(key = %key, size = data.len(), "Cached result");
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        self.get_bytes(key)
            .await?
            .map(|data| serde_json::from_slice(&data))
            .transpose()
            .map_err(ApiError::from)
    }

    /// Drop index entries past the maximum age. Blocking.
    pub fn prune_expired(&self) -> Result<usize, ApiError> {
        let expired: Vec<String> = cacache::list_sync(&self.dir)
            .filter_map(Result::ok)
            .filter(|entry| self.is_expired(entry.time))
            .map(|entry| entry.key)
            .collect();
        for key in &expired {
            cacache::remove_sync(&self.dir, key)?;
        }
        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        let body = br#"{"meshes":[]}"#;
        let drawing = DiskCache::generate_key("drawing", body);
        let svg = DiskCache::generate_key("svg", body);
        assert_eq!(drawing.len(), 64);
        assert_ne!(drawing, svg);
        assert_eq!(drawing, DiskCache::generate_key("drawing", body));
    }

    #[tokio::test]
    async fn test_round_trip_and_expiry() {
        let dir = std::env::temp_dir().join(format!("ifc-lite-drawing-cache-{}", std::process::id()));
        let dir = dir.to_string_lossy().into_owned();

        let fresh = DiskCache::open(&dir, Duration::from_secs(3600)).await;
        fresh.put_bytes("k", b"<svg/>").await.unwrap();
        assert_eq!(fresh.get_bytes("k").await.unwrap().as_deref(), Some(&b"<svg/>"[..]));
        assert_eq!(fresh.get_bytes("missing").await.unwrap(), None);

        let stale = DiskCache::open(&dir, Duration::ZERO).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(stale.get_bytes("k").await.unwrap(), None);
        assert!(stale.prune_expired().unwrap() >= 1);
        assert_eq!(fresh.get_bytes("k").await.unwrap(), None);
    }
}
