//! Document ingestion
//!
//! Upload, hash, notarize, persist. The upload is the only step with an
//! effect that can be undone, so it carries the single compensation: when
//! anything after it fails, the blob is deleted and no document is written.
use crate::audit::AuditAction;
use crate::blob::BlobStore;
use crate::config::EngineConfig;
use crate::document::{Document, DocumentId, DocumentStatus, DocumentType, UserId};
use crate::engine::SigningEngine;
use crate::error::EngineError;
use crate::identity::Caller;
use crate::notary::{NotarizationError, NotarizationRequest, Notarizer};
use crate::saga::Saga;
use crate::store::DocumentStore;
use crate::timestamp::TimeStamp;
use crate::utils;
use std::sync::Arc;

pub struct IngestionPipeline<S: DocumentStore, B: BlobStore, N: Notarizer> {
    engine: Arc<SigningEngine<S>>,
    blobs: Arc<B>,
    notarizer: Arc<N>,
    namespace: String,
}

impl<S: DocumentStore, B: BlobStore, N: Notarizer> IngestionPipeline<S, B, N> {
    pub fn new(
        engine: Arc<SigningEngine<S>>,
        blobs: Arc<B>,
        notarizer: Arc<N>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            engine,
            blobs,
            notarizer,
            namespace: config.blob_namespace.clone(),
        }
    }

    pub fn engine(&self) -> &Arc<SigningEngine<S>> {
        &self.engine
    }

    /// Store, hash and notarize `bytes`, then persist a pending document
    /// with an empty signature ledger.
    pub fn create_document(
        &self,
        name: &str,
        doc_type: DocumentType,
        uploaded_by: &UserId,
        bytes: &[u8],
    ) -> Result<Document, EngineError> {
        let id = DocumentId::generate()?;
        let key = utils::blob_key(&self.namespace, name);
        let (key, blobs) = (key.as_str(), self.blobs.as_ref());

        let document = Saga::new("ingest").run(|saga| {
            saga.step_with(
                "store content",
                || {
                    blobs
                        .put(key, bytes)
                        .map_err(|e| EngineError::storage(format!("storing blob {key}"), e))
                },
                move || blobs.delete(key),
            )?;

            let content_hash = saga.step("hash content", || {
                let stored = blobs
                    .get(key)
                    .map_err(|e| EngineError::storage(format!("reading back blob {key}"), e))?;
                Ok(utils::content_digest(&stored))
            })?;

            let receipt = saga.step("notarize", || {
                let request = NotarizationRequest {
                    document_hash: content_hash.clone(),
                    reference: key.to_string(),
                    doc_type,
                    user_id: uploaded_by.clone(),
                    timestamp: TimeStamp::new(),
                };
                self.notarizer.notarize(&request).map_err(|e| match e {
                    NotarizationError::Timeout {
                        elapsed, receipt, ..
                    } => EngineError::NotarizationOverrun {
                        receipt,
                        content_hash: content_hash.clone(),
                        reference: key.to_string(),
                        elapsed,
                    },
                    other => EngineError::NotarizationFailed(other.to_string()),
                })
            })?;

            let document = Document::new(
                id,
                name.to_string(),
                doc_type,
                uploaded_by.clone(),
                key.to_string(),
                content_hash,
            );

            saga.step("persist document", || {
                self.engine
                    .store()
                    .insert(&document)
                    .map_err(|source| EngineError::Unreconciled {
                        receipt: receipt.clone(),
                        content_hash: document.content_hash.clone(),
                        reference: key.to_string(),
                        source,
                    })
            })?;

            tracing::info!(
                document = %document.id,
                doc_type = %doc_type,
                hash = %document.content_hash,
                receipt = %receipt,
                "document ingested"
            );
            Ok(document)
        })?;

        Ok(document)
    }

    /// Record the signed rendition of a completed document.
    pub fn attach_signed_content(
        &self,
        id: &DocumentId,
        bytes: &[u8],
        caller: &Caller,
    ) -> Result<Document, EngineError> {
        let engine = self.engine.as_ref();

        engine.locks().with_document(id, || {
            let mut document = engine.load(id)?;

            if !caller.role.is_admin() && document.uploaded_by != caller.user_id {
                return Err(EngineError::NotOwner {
                    document: id.clone(),
                    caller: caller.user_id.to_string(),
                });
            }
            if document.status != DocumentStatus::Completed {
                return Err(EngineError::NotCompleted {
                    document: id.clone(),
                    status: document.status,
                });
            }
            if document.signed_content_ref.is_some() {
                return Err(EngineError::SignedContentExists(id.clone()));
            }

            let key = utils::blob_key(&self.namespace, &format!("signed_{}", document.name));
            let (key, blobs) = (key.as_str(), self.blobs.as_ref());

            Saga::new("attach signed content").run(|saga| {
                saga.step_with(
                    "store signed content",
                    || {
                        blobs
                            .put(key, bytes)
                            .map_err(|e| EngineError::storage(format!("storing blob {key}"), e))
                    },
                    move || blobs.delete(key),
                )?;

                let content_hash = utils::content_digest(bytes);
                document.signed_content_ref = Some(key.to_string());
                document.signed_content_hash = Some(content_hash.clone());

                saga.step("persist document", || {
                    let record = engine.audit_record(
                        id,
                        Some(caller),
                        AuditAction::SignedContentAttached { content_hash },
                    )?;
                    engine.commit(&document, &[record], || {
                        format!("attaching signed content to {id}")
                    })
                })?;

                tracing::info!(document = %id, blob = key, "signed content attached");
                Ok(document)
            })
        })
    }
}
