use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::Utc;

use crate::account::errors::StorageError;
use crate::account::models::UploadCategory;
use crate::account::ports::DocumentStore;

/// Upload storage on the local filesystem.
///
/// The tree is partitioned by category (`profiles/`, `products/`,
/// `documents/`). Stored names are `<category>-<millis>-<n><ext>`, so two
/// uploads of the same original filename never collide; the original name
/// survives only in the account's document metadata.
pub struct FilesystemDocumentStore {
    root: PathBuf,
    // Tie-breaker for uploads landing on the same millisecond
    counter: AtomicU64,
}

impl FilesystemDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn stored_name(&self, category: UploadCategory, original_filename: &str) -> String {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let n = self.counter.fetch_add(1, Ordering::Relaxed);

        format!(
            "{}-{}-{}{}",
            category.directory(),
            Utc::now().timestamp_millis(),
            n,
            extension
        )
    }
}

#[async_trait]
impl DocumentStore for FilesystemDocumentStore {
    async fn store(
        &self,
        category: UploadCategory,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let directory = self.root.join(category.directory());
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        let stored_name = self.stored_name(category, original_filename);
        let path = directory.join(&stored_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        // The reference is root-relative so the tree can move between hosts
        Ok(format!("{}/{}", category.directory(), stored_name))
    }
}
