//! Persistence for documents and their audit trail
use crate::audit::AuditRecord;
use crate::document::{Document, DocumentId};
use crate::error::StorageError;
use sled::Transactional;
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use std::sync::Arc;

const DOCUMENTS_TREE: &str = "documents";
const AUDIT_TREE: &str = "audit";

/// Durable storage for documents and audit records.
///
/// `commit` must write the document and every audit record as one unit:
/// either all of them become visible or none do.
pub trait DocumentStore: Send + Sync {
    fn load(&self, id: &DocumentId) -> Result<Option<Document>, StorageError>;

    /// Insert a new document. Fails with [`StorageError::Duplicate`] if the id is taken.
    fn insert(&self, document: &Document) -> Result<(), StorageError>;

    fn commit(&self, document: &Document, audit: &[AuditRecord]) -> Result<(), StorageError>;

    /// Audit records for a document in append order.
    fn audit_trail(&self, id: &DocumentId) -> Result<Vec<AuditRecord>, StorageError>;

    fn documents(&self) -> Result<Vec<Document>, StorageError>;

    /// Next audit record id. Ids increase monotonically.
    fn next_audit_id(&self) -> Result<u64, StorageError>;
}

pub struct SledStore {
    instance: Arc<sled::Db>,
    documents: sled::Tree,
    audit: sled::Tree,
}

impl SledStore {
    pub fn new(instance: Arc<sled::Db>) -> Result<Self, StorageError> {
        let documents = instance.open_tree(DOCUMENTS_TREE)?;
        let audit = instance.open_tree(AUDIT_TREE)?;

        Ok(Self {
            instance,
            documents,
            audit,
        })
    }

    // `<document id>/<big-endian record id>` keeps a document's records
    // contiguous and in append order under a prefix scan.
    fn audit_key(record: &AuditRecord) -> Vec<u8> {
        let mut key = Self::audit_prefix(&record.document_id);
        key.extend_from_slice(&record.id.to_be_bytes());
        key
    }

    fn audit_prefix(id: &DocumentId) -> Vec<u8> {
        let mut prefix = id.as_str().as_bytes().to_vec();
        prefix.push(b'/');
        prefix
    }
}

impl DocumentStore for SledStore {
    fn load(&self, id: &DocumentId) -> Result<Option<Document>, StorageError> {
        match self.documents.get(id.as_str().as_bytes())? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, document: &Document) -> Result<(), StorageError> {
        let encoded = minicbor::to_vec(document)?;

        self.documents
            .compare_and_swap(
                document.id.as_str().as_bytes(),
                None as Option<&[u8]>,
                Some(encoded),
            )?
            .map_err(|_| StorageError::Duplicate(document.id.to_string()))?;
        self.instance.flush()?;

        Ok(())
    }

    fn commit(&self, document: &Document, audit: &[AuditRecord]) -> Result<(), StorageError> {
        let encoded = minicbor::to_vec(document)?;
        let mut records = Vec::with_capacity(audit.len());
        for record in audit {
            records.push((Self::audit_key(record), minicbor::to_vec(record)?));
        }

        (&self.documents, &self.audit)
            .transaction(|(documents, audit)| -> ConflictableTransactionResult<(), ()> {
                documents.insert(document.id.as_str().as_bytes(), encoded.clone())?;
                for (key, value) in &records {
                    audit.insert(key.as_slice(), value.clone())?;
                }
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Storage(e) => StorageError::Sled(e),
                TransactionError::Abort(()) => StorageError::Aborted,
            })?;
        self.instance.flush()?;

        Ok(())
    }

    fn audit_trail(&self, id: &DocumentId) -> Result<Vec<AuditRecord>, StorageError> {
        self.audit
            .scan_prefix(Self::audit_prefix(id))
            .values()
            .map(|value| Ok(minicbor::decode(&value?)?))
            .collect()
    }

    fn documents(&self) -> Result<Vec<Document>, StorageError> {
        self.documents
            .iter()
            .values()
            .map(|value| Ok(minicbor::decode(&value?)?))
            .collect()
    }

    fn next_audit_id(&self) -> Result<u64, StorageError> {
        Ok(self.instance.generate_id()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::document::{DocumentType, UserId};
    use crate::role::SigningRole;
    use crate::utils;
    use tempfile::tempdir;

    fn open_store(dir: &tempfile::TempDir) -> SledStore {
        let db = sled::open(dir.path().join("store.db")).unwrap();
        SledStore::new(Arc::new(db)).unwrap()
    }

    fn document() -> Document {
        Document::new(
            DocumentId::generate().unwrap(),
            "affidavit.pdf".into(),
            DocumentType::Affidavit,
            UserId::generate().unwrap(),
            "docs/1_affidavit.pdf".into(),
            utils::content_digest(b"affidavit"),
        )
    }

    #[test]
    fn insert_rejects_existing_id() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let doc = document();

        store.insert(&doc).unwrap();

        assert!(matches!(store.insert(&doc), Err(StorageError::Duplicate(_))));
        assert_eq!(store.load(&doc.id).unwrap(), Some(doc));
    }

    #[test]
    fn audit_trail_is_scoped_and_ordered() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        let first = document();
        let second = document();
        store.insert(&first).unwrap();
        store.insert(&second).unwrap();

        for (doc, role) in [
            (&first, SigningRole::Notary),
            (&second, SigningRole::Grantor),
            (&first, SigningRole::Affiant),
        ] {
            let record = AuditRecord::new(
                store.next_audit_id().unwrap(),
                doc.id.clone(),
                Some(doc.uploaded_by.clone()),
                AuditAction::Signed { role },
            );
            store.commit(doc, &[record]).unwrap();
        }

        let roles: Vec<_> = store
            .audit_trail(&first.id)
            .unwrap()
            .iter()
            .filter_map(AuditRecord::role)
            .collect();

        assert_eq!(roles, vec![SigningRole::Notary, SigningRole::Affiant]);
        assert_eq!(store.audit_trail(&second.id).unwrap().len(), 1);
        assert_eq!(store.documents().unwrap().len(), 2);
    }

    #[test]
    fn missing_document_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        let id = DocumentId::generate().unwrap();
        assert!(store.load(&id).unwrap().is_none());
        assert!(store.audit_trail(&id).unwrap().is_empty());
    }
}
