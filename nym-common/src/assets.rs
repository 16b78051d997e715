//! Circuit and witness-generator assets, fetched once per URI and shared.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::sync::OnceCell;

use crate::{error::BackendError, hash_bytes_hex};

/// Immutable asset bytes shared between concurrent calls.
pub type Asset = Arc<[u8]>;

static SHARED_ASSETS: Lazy<Arc<AssetCache>> = Lazy::new(|| Arc::new(AssetCache::new()));

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BackendError>;
}

/// Resolves `file://` URIs and bare paths from disk and, with the `http`
/// feature, `http(s)://` URIs over the network.
#[derive(Clone, Debug, Default)]
pub struct UriFetcher {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl UriFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "http")]
    async fn fetch_http(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        let asset_error = |err: reqwest::Error| BackendError::Asset {
            uri: uri.to_owned(),
            reason: err.to_string(),
        };
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(asset_error)?;
        let bytes = response.bytes().await.map_err(asset_error)?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_http(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::Asset {
            uri: uri.to_owned(),
            reason: "built without the `http` feature".into(),
        })
    }
}

#[async_trait]
impl AssetFetcher for UriFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.fetch_http(uri).await;
        }
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        tokio::fs::read(path)
            .await
            .map_err(|err| BackendError::Asset {
                uri: uri.to_owned(),
                reason: err.to_string(),
            })
    }
}

/// Single-flight cache keyed by URI. Concurrent loads of one URI share a
/// single fetch; failed fetches leave the slot empty for the next caller.
#[derive(Debug, Default)]
pub struct AssetCache {
    slots: Mutex<HashMap<String, Arc<OnceCell<Asset>>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used unless a caller supplies its own.
    pub fn shared() -> Arc<AssetCache> {
        Arc::clone(&SHARED_ASSETS)
    }

    pub async fn load(&self, uri: &str, fetcher: &dyn AssetFetcher) -> Result<Asset, BackendError> {
        let slot = self.slot(uri);
        let asset = slot
            .get_or_try_init(|| async {
                let bytes = fetcher.fetch(uri).await?;
                tracing::info!(uri, size = bytes.len(), blake3 = %hash_bytes_hex(&bytes), "loaded asset");
                Ok::<Asset, BackendError>(Asset::from(bytes))
            })
            .await?;
        Ok(Arc::clone(asset))
    }

    /// Like [`AssetCache::load`], then checks the blake3 digest when one is given.
    pub async fn load_pinned(
        &self,
        uri: &str,
        fetcher: &dyn AssetFetcher,
        expected_blake3: Option<&str>,
    ) -> Result<Asset, BackendError> {
        let asset = self.load(uri, fetcher).await?;
        if let Some(expected) = expected_blake3 {
            let actual = hash_bytes_hex(&asset);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(BackendError::Integrity {
                    uri: uri.to_owned(),
                    expected: expected.to_owned(),
                    actual,
                });
            }
        }
        Ok(asset)
    }

    pub fn is_cached(&self, uri: &str) -> bool {
        self.lock()
            .get(uri)
            .map_or(false, |slot| slot.initialized())
    }

    pub fn evict(&self, uri: &str) {
        self.lock().remove(uri);
    }

    fn slot(&self, uri: &str) -> Arc<OnceCell<Asset>> {
        Arc::clone(self.lock().entry(uri.to_owned()).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<Asset>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
