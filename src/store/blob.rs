use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{StoreError, StoreResult};

/// Binary attachment storage (employee documents).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `path` and returns its url.
    async fn put_file(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String>;

    async fn download_url(&self, url: &str) -> StoreResult<String>;

    async fn delete_by_url(&self, url: &str) -> StoreResult<()>;
}

const MEMORY_SCHEME: &str = "memory://";

#[derive(Default)]
pub struct MemoryBlobStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        Self::path_of(url).is_some_and(|path| self.files.lock().contains_key(path))
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }

    fn path_of(url: &str) -> Option<&str> {
        url.strip_prefix(MEMORY_SCHEME)
    }

    fn not_found(url: &str) -> StoreError {
        StoreError::NotFound {
            collection: "blobs".into(),
            id: url.to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_file(&self, path: &str, bytes: Vec<u8>) -> StoreResult<String> {
        if path.trim().is_empty() {
            return Err(StoreError::InvalidArgument("blob path is empty".into()));
        }
        self.files.lock().insert(path.to_string(), bytes);
        Ok(format!("{MEMORY_SCHEME}{path}"))
    }

    async fn download_url(&self, url: &str) -> StoreResult<String> {
        if self.contains(url) {
            Ok(url.to_string())
        } else {
            Err(Self::not_found(url))
        }
    }

    async fn delete_by_url(&self, url: &str) -> StoreResult<()> {
        let path = Self::path_of(url).ok_or_else(|| Self::not_found(url))?;
        match self.files.lock().remove(path) {
            Some(_) => Ok(()),
            None => Err(Self::not_found(url)),
        }
    }
}
