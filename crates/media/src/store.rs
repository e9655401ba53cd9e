//! Image store implementations.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{MediaError, Result};

/// Stores listing images and hands back public URLs.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Upload one image; returns the URL it is served from.
    async fn store(&self, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<String>;
}

/// Upload response shape of the storage endpoint.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// Uploads images to an HTTP storage endpoint via multipart POST.
pub struct HttpImageStore {
    http: Client,
    upload_url: String,
}

impl HttpImageStore {
    /// Create a store client for the given upload endpoint.
    pub fn new(upload_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MediaError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            upload_url: upload_url.into(),
        })
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn store(&self, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| MediaError::InvalidImage(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::UploadFailed(format!(
                "storage endpoint returned {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::UploadFailed(e.to_string()))?;

        tracing::debug!(url = %uploaded.url, size, "image uploaded");
        Ok(uploaded.url)
    }
}

/// One image held by [`MemoryImageStore`].
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub url: String,
}

/// Keeps images in memory and serves `memory://` URLs. For tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageStore {
    images: Arc<Mutex<Vec<StoredImage>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn stored(&self) -> Vec<StoredImage> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn store(&self, filename: &str, content_type: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("memory://{}/{}", Uuid::new_v4(), filename);
        let image = StoredImage {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
            url: url.clone(),
        };
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(image);
        Ok(url)
    }
}

/// Stands in when no storage endpoint is configured; every upload reports
/// the collaborator as unavailable.
#[derive(Debug, Clone, Default)]
pub struct DisabledImageStore;

#[async_trait]
impl ImageStore for DisabledImageStore {
    async fn store(&self, _filename: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<String> {
        Err(MediaError::Unavailable(
            "image storage is not configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryImageStore::new();

        let url = store
            .store("desk.jpg", "image/jpeg", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(url.starts_with("memory://"));
        assert!(url.ends_with("/desk.jpg"));

        let stored = store.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].bytes, vec![1, 2, 3]);
        assert_eq!(stored[0].content_type, "image/jpeg");
        assert_eq!(stored[0].url, url);
    }

    #[tokio::test]
    async fn test_disabled_store() {
        let store = DisabledImageStore;
        let result = store.store("a.jpg", "image/jpeg", vec![]).await;
        assert!(matches!(result, Err(MediaError::Unavailable(_))));
    }
}
