//! Shared fixtures for integration tests.
//!
//! Every test opens its own sled database under a temp dir; sled holds a file
//! lock, so databases are never shared between tests.
#![allow(dead_code)]

use document_cosign::{
    audit::AuditRecord,
    blob::{BlobStore, SledBlobStore},
    config::EngineConfig,
    document::{Document, DocumentId, DocumentType, UserId},
    engine::SigningEngine,
    error::StorageError,
    identity::Caller,
    ingest::IngestionPipeline,
    notary::{LedgerNotarizer, NotarizationError, NotarizationReceipt, NotarizationRequest, Notarizer},
    policy::StandardPolicy,
    role::CallerRole,
    store::{DocumentStore, SledStore},
    telemetry,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub type CommitHook = Box<dyn Fn(&Document) -> Result<(), StorageError> + Send + Sync>;

/// Store that runs a hook before each commit and can be told to fail writes.
pub struct HookedStore {
    inner: SledStore,
    pub fail_commits: AtomicBool,
    pub fail_inserts: AtomicBool,
    on_commit: Option<CommitHook>,
}

impl HookedStore {
    pub fn new(inner: SledStore) -> Self {
        Self {
            inner,
            fail_commits: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            on_commit: None,
        }
    }

    pub fn with_hook(mut self, hook: CommitHook) -> Self {
        self.on_commit = Some(hook);
        self
    }
}

impl DocumentStore for HookedStore {
    fn load(&self, id: &DocumentId) -> Result<Option<Document>, StorageError> {
        self.inner.load(id)
    }

    fn insert(&self, document: &Document) -> Result<(), StorageError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("database offline".into()));
        }
        self.inner.insert(document)
    }

    fn commit(&self, document: &Document, audit: &[AuditRecord]) -> Result<(), StorageError> {
        if let Some(hook) = &self.on_commit {
            hook(document)?;
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("database offline".into()));
        }
        self.inner.commit(document, audit)
    }

    fn audit_trail(&self, id: &DocumentId) -> Result<Vec<AuditRecord>, StorageError> {
        self.inner.audit_trail(id)
    }

    fn documents(&self) -> Result<Vec<Document>, StorageError> {
        self.inner.documents()
    }

    fn next_audit_id(&self) -> Result<u64, StorageError> {
        self.inner.next_audit_id()
    }
}

/// Blob store whose deletes can be made to fail, and whose puts can be made
/// to overrun the collaborator bound.
pub struct FragileBlobStore {
    pub inner: SledBlobStore,
    pub fail_deletes: AtomicBool,
    pub slow_puts: AtomicBool,
}

impl BlobStore for FragileBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if self.slow_puts.load(Ordering::SeqCst) {
            // an overrunning put is abandoned without leaving the blob
            return Err(StorageError::Unavailable(format!(
                "blob put for {key} exceeded the collaborator timeout"
            )));
        }
        self.inner.put(key, bytes)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("blob store offline".into()));
        }
        self.inner.delete(key)
    }
}

/// Notarizer that can be switched off, or made to answer after its bound.
pub struct SwitchableNotarizer {
    pub inner: LedgerNotarizer,
    pub offline: AtomicBool,
    pub late: AtomicBool,
}

impl Notarizer for SwitchableNotarizer {
    fn notarize(&self, request: &NotarizationRequest) -> Result<NotarizationReceipt, NotarizationError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(NotarizationError::Rejected("ledger unreachable".into()));
        }
        let receipt = self.inner.notarize(request)?;
        if self.late.load(Ordering::SeqCst) {
            return Err(NotarizationError::Timeout {
                elapsed: Duration::from_secs(30),
                limit: Duration::from_secs(10),
                receipt,
            });
        }
        Ok(receipt)
    }
}

pub struct Harness {
    // keeps the database directory alive for the duration of the test
    pub temp_dir: TempDir,
    pub db: Arc<sled::Db>,
    pub store: Arc<HookedStore>,
    pub engine: Arc<SigningEngine<HookedStore>>,
    pub blobs: Arc<FragileBlobStore>,
    pub notarizer: Arc<SwitchableNotarizer>,
    pub pipeline: IngestionPipeline<HookedStore, FragileBlobStore, SwitchableNotarizer>,
}

pub fn harness() -> anyhow::Result<Harness> {
    build(None, EngineConfig::default())
}

pub fn harness_with_hook(
    hook: impl Fn(&Document) -> Result<(), StorageError> + Send + Sync + 'static,
) -> anyhow::Result<Harness> {
    build(Some(Box::new(hook)), EngineConfig::default())
}

pub fn harness_with_config(config: EngineConfig) -> anyhow::Result<Harness> {
    build(None, config)
}

fn build(hook: Option<CommitHook>, config: EngineConfig) -> anyhow::Result<Harness> {
    let temp_dir = tempfile::tempdir()?;
    let config = EngineConfig {
        database_path: temp_dir.path().join("cosign.db"),
        ..config
    };
    config.validate()?;
    telemetry::init(&config.log_filter);
    let db = Arc::new(config.open_database()?);

    let mut store = HookedStore::new(SledStore::new(db.clone())?);
    if let Some(hook) = hook {
        store = store.with_hook(hook);
    }
    let store = Arc::new(store);

    let engine = Arc::new(SigningEngine::with_config(
        store.clone(),
        Arc::new(StandardPolicy),
        &config,
    ));
    let blobs = Arc::new(FragileBlobStore {
        inner: SledBlobStore::new(db.clone())?,
        fail_deletes: AtomicBool::new(false),
        slow_puts: AtomicBool::new(false),
    });
    let notarizer = Arc::new(SwitchableNotarizer {
        inner: LedgerNotarizer::new(db.clone(), config.collaborator_timeout())?,
        offline: AtomicBool::new(false),
        late: AtomicBool::new(false),
    });
    let pipeline = IngestionPipeline::new(engine.clone(), blobs.clone(), notarizer.clone(), &config);

    Ok(Harness {
        temp_dir,
        db,
        store,
        engine,
        blobs,
        notarizer,
        pipeline,
    })
}

impl Harness {
    pub fn upload(&self, doc_type: DocumentType, owner: &Caller) -> anyhow::Result<DocumentId> {
        let name = format!("{doc_type}.pdf");
        let document = self.pipeline.create_document(
            &name,
            doc_type,
            &owner.user_id,
            format!("%PDF-1.7 {doc_type} body").as_bytes(),
        )?;
        Ok(document.id)
    }
}

pub fn caller(role: CallerRole) -> anyhow::Result<Caller> {
    Ok(Caller::new(UserId::generate()?, role))
}
