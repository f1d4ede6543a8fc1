//! Notarization collaborator
//!
//! A notarizer anchors a content hash and returns a receipt. Implementations
//! may be remote and unreliable; the ingestion pipeline compensates when they fail.
use crate::document::{DocumentType, UserId};
use crate::error::StorageError;
use crate::timestamp::TimeStamp;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const NOTARIZATIONS_TREE: &str = "notarizations";

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct NotarizationRequest {
    #[n(0)]
    pub document_hash: String,
    #[n(1)]
    pub reference: String,
    #[n(2)]
    pub doc_type: DocumentType,
    #[n(3)]
    pub user_id: UserId,
    #[n(4)]
    pub timestamp: TimeStamp,
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct NotarizationReceipt {
    #[n(0)]
    pub receipt_id: String,
    #[n(1)]
    pub document_hash: String,
    #[n(2)]
    pub recorded_at: TimeStamp,
}

#[derive(thiserror::Error, Debug)]
pub enum NotarizationError {
    /// The entry was recorded but the call overran its bound. The receipt is
    /// still a valid anchor and must reach the caller.
    #[error("notarization took {elapsed:?}, over the {limit:?} bound; recorded as {receipt}")]
    Timeout {
        elapsed: Duration,
        limit: Duration,
        receipt: NotarizationReceipt,
    },
    #[error("notarization rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub trait Notarizer: Send + Sync {
    fn notarize(&self, request: &NotarizationRequest) -> Result<NotarizationReceipt, NotarizationError>;
}

impl fmt::Display for NotarizationReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.receipt_id)
    }
}

impl NotarizationRequest {
    /// Hash and CBOR encoding of the request. The hash doubles as the receipt id.
    pub fn build(&self) -> Result<(String, Vec<u8>), StorageError> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

/// Append-only notarization ledger kept in a local sled tree.
pub struct LedgerNotarizer {
    instance: Arc<sled::Db>,
    entries: sled::Tree,
    timeout: Duration,
}

impl LedgerNotarizer {
    pub fn new(instance: Arc<sled::Db>, timeout: Duration) -> Result<Self, StorageError> {
        let entries = instance.open_tree(NOTARIZATIONS_TREE)?;
        Ok(Self {
            instance,
            entries,
            timeout,
        })
    }

    pub fn lookup(&self, receipt_id: &str) -> Result<Option<NotarizationRequest>, StorageError> {
        match self.entries.get(receipt_id.as_bytes())? {
            Some(bytes) => Ok(Some(minicbor::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl Notarizer for LedgerNotarizer {
    fn notarize(&self, request: &NotarizationRequest) -> Result<NotarizationReceipt, NotarizationError> {
        let started = std::time::Instant::now();
        let (receipt_id, cbor) = request.build()?;

        self.entries
            .insert(receipt_id.as_bytes(), cbor)
            .map_err(StorageError::from)?;
        self.instance.flush().map_err(StorageError::from)?;

        let receipt = NotarizationReceipt {
            receipt_id,
            document_hash: request.document_hash.clone(),
            recorded_at: TimeStamp::new(),
        };

        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            return Err(NotarizationError::Timeout {
                elapsed,
                limit: self.timeout,
                receipt,
            });
        }

        Ok(receipt)
    }
}
