use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::storage::{ObjectStorage, StorageError};

/// Records every upload and delete; either side can be switched to fail.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    base_url: String,
    objects: Mutex<BTreeMap<String, (String, Vec<u8>)>>,
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_uploads_named: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Fail only uploads whose file name ends with `suffix`.
    pub fn fail_uploads_ending_with(&self, suffix: impl Into<String>) {
        lock(&self.fail_uploads_named).push(suffix.into());
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), file_name)
    }

    /// File names passed to `upload`, successful or not.
    pub fn uploads(&self) -> Vec<String> {
        lock(&self.uploads).clone()
    }

    /// File names passed to `delete`, successful or not.
    pub fn deletes(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        lock(&self.objects).contains_key(file_name)
    }

    pub fn object(&self, file_name: &str) -> Option<(String, Vec<u8>)> {
        lock(&self.objects).get(file_name).cloned()
    }

    pub fn object_count(&self) -> usize {
        lock(&self.objects).len()
    }

    /// Seeds an object as if an earlier request had uploaded it.
    pub fn insert(&self, file_name: &str, mime_type: &str, bytes: Vec<u8>) -> String {
        lock(&self.objects).insert(file_name.to_string(), (mime_type.to_string(), bytes));
        self.url_for(file_name)
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        lock(&self.uploads).push(file_name.to_string());

        let named_failure = lock(&self.fail_uploads_named)
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()));
        if self.fail_uploads.load(Ordering::SeqCst) || named_failure {
            return Err(StorageError::Upload {
                file_name: file_name.to_string(),
                message: "bucket unavailable".to_string(),
            });
        }

        Ok(self.insert(file_name, mime_type, bytes))
    }

    async fn delete(&self, file_name: &str) -> Result<(), StorageError> {
        lock(&self.deletes).push(file_name.to_string());

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete {
                file_name: file_name.to_string(),
                message: "bucket unavailable".to_string(),
            });
        }

        lock(&self.objects).remove(file_name);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
