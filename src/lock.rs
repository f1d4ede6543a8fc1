//! Per-document critical sections
//!
//! One mutex per document id, created on first use and never evicted. The
//! registry grows with the number of distinct documents touched by this
//! process. It only excludes within a single process; multiple engine
//! instances sharing a store need row-level locking in the store instead.
use crate::document::DocumentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<DocumentId, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, id: &DocumentId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.entry(id.clone()).or_default().clone()
    }

    /// Run `f` while holding the lock for `id`. Calls for the same id are
    /// strictly serialized; calls for different ids never wait on each other.
    pub fn with_document<T>(&self, id: &DocumentId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(id);
        let _guard = handle.lock();
        f()
    }

    /// Number of documents that have ever been locked.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}
