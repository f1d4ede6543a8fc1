//! Blob storage for raw document content
use crate::error::StorageError;
use std::sync::Arc;

const BLOBS_TREE: &str = "blobs";

/// Content-addressable-by-key byte store. Keys are chosen by the caller.
///
/// Every call must return within the deployment's collaborator bound
/// (`EngineConfig::collaborator_timeout`). Remote implementations enforce it
/// themselves and report an overrun as [`StorageError::Unavailable`], which
/// the engine treats as retryable. A `put` that overran must not leave the
/// blob behind, since no compensation is registered for a failed step.
pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

pub struct SledBlobStore {
    instance: Arc<sled::Db>,
    blobs: sled::Tree,
}

impl SledBlobStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StorageError> {
        let blobs = instance.open_tree(BLOBS_TREE)?;
        Ok(Self { instance, blobs })
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(key.as_bytes())?)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BlobStore for SledBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.blobs.insert(key.as_bytes(), bytes)?;
        self.instance.flush()?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.blobs
            .get(key.as_bytes())?
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| StorageError::MissingBlob(key.to_string()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.blobs.remove(key.as_bytes())?;
        self.instance.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_get_delete() -> anyhow::Result<()> {
        let temp_dir = tempdir()?;
        let db = Arc::new(sled::open(temp_dir.path().join("blobs.db"))?);
        let blobs = SledBlobStore::new(db)?;

        blobs.put("docs/a", b"content")?;
        assert_eq!(blobs.get("docs/a")?, b"content");
        assert!(blobs.contains("docs/a")?);

        blobs.delete("docs/a")?;
        assert!(matches!(blobs.get("docs/a"), Err(StorageError::MissingBlob(_))));
        assert!(blobs.is_empty());

        Ok(())
    }
}
