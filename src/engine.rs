//! Document signing workflow
//!
//! Every mutation of a document runs inside that document's critical section
//! and is applied to a copy of the loaded record. The copy only replaces the
//! stored record through a single atomic commit together with its audit
//! records, so a failed commit leaves nothing behind. Reads go straight to the
//! store without taking the lock.
use crate::audit::{AuditAction, AuditRecord};
use crate::config::EngineConfig;
use crate::document::{Document, DocumentId, DocumentStatus};
use crate::error::{EngineError, LedgerError};
use crate::identity::Caller;
use crate::ledger::SignatureEntry;
use crate::lock::DocumentLocks;
use crate::policy::{RolePolicy, RoleSet};
use crate::role::SigningRole;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignConfirmation {
    pub document_id: DocumentId,
    pub role: SigningRole,
    pub message: String,
    /// Present when completion was evaluated as part of the signing commit.
    pub completion: Option<CompletionReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningStatus {
    pub document: Document,
    pub signed_roles: RoleSet,
    pub unsigned_roles: RoleSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub document_id: DocumentId,
    pub is_complete: bool,
    pub signed_roles: RoleSet,
    pub missing_roles: RoleSet,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSignatures {
    pub document_id: DocumentId,
    pub pending_roles: RoleSet,
    pub complete: bool,
}

pub struct SigningEngine<S: DocumentStore> {
    store: Arc<S>,
    policy: Arc<dyn RolePolicy>,
    locks: DocumentLocks,
    auto_complete: bool,
}

impl<S: DocumentStore> SigningEngine<S> {
    pub fn new(store: Arc<S>, policy: Arc<dyn RolePolicy>) -> Self {
        Self {
            store,
            policy,
            locks: DocumentLocks::new(),
            auto_complete: true,
        }
    }

    pub fn with_config(store: Arc<S>, policy: Arc<dyn RolePolicy>, config: &EngineConfig) -> Self {
        Self::new(store, policy).auto_complete(config.auto_complete)
    }

    /// Whether a successful signature also completes the document when it
    /// fills the last required role.
    pub fn auto_complete(mut self, enabled: bool) -> Self {
        self.auto_complete = enabled;
        self
    }

    pub fn policy(&self) -> &dyn RolePolicy {
        self.policy.as_ref()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn locks(&self) -> &DocumentLocks {
        &self.locks
    }

    pub(crate) fn load(&self, id: &DocumentId) -> Result<Document, EngineError> {
        self.store
            .load(id)
            .map_err(|e| EngineError::storage(format!("loading document {id}"), e))?
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    pub(crate) fn audit_record(
        &self,
        document_id: &DocumentId,
        user_id: Option<&Caller>,
        action: AuditAction,
    ) -> Result<AuditRecord, EngineError> {
        let id = self
            .store
            .next_audit_id()
            .map_err(|e| EngineError::storage("allocating audit record id", e))?;

        Ok(AuditRecord::new(
            id,
            document_id.clone(),
            user_id.map(|c| c.user_id.clone()),
            action,
        ))
    }

    pub(crate) fn commit(
        &self,
        document: &Document,
        audit: &[AuditRecord],
        context: impl FnOnce() -> String,
    ) -> Result<(), EngineError> {
        self.store
            .commit(document, audit)
            .map_err(|e| EngineError::storage(context(), e))
    }

    /// Sign `role` on a document on behalf of `caller`.
    pub fn sign_document(
        &self,
        id: &DocumentId,
        role: &str,
        signature: impl Into<String>,
        caller: &Caller,
    ) -> Result<SignConfirmation, EngineError> {
        let result = self.try_sign(id, role, signature.into(), caller);
        if let Err(err) = &result {
            tracing::warn!(
                document = %id,
                role,
                caller = %caller.user_id,
                error = %err,
                "signature rejected"
            );
        }
        result
    }

    fn try_sign(
        &self,
        id: &DocumentId,
        role: &str,
        signature: String,
        caller: &Caller,
    ) -> Result<SignConfirmation, EngineError> {
        let document = self.load(id)?;
        ensure_open(&document)?;

        let role: SigningRole = role
            .parse()
            .map_err(|_| EngineError::InvalidRole {
                document: id.clone(),
                role: role.to_string(),
            })?;

        if !self.policy.permits(caller.role, role) {
            return Err(EngineError::Forbidden {
                document: id.clone(),
                caller: caller.role,
                role,
            });
        }

        self.locks.with_document(id, || {
            // reload: a request that held the lock before us may have
            // signed this role or closed the document
            let current = self.load(id)?;
            ensure_open(&current)?;

            let mut next = current.clone();
            next.signatures
                .put(SignatureEntry::new(role, caller.user_id.clone(), signature))
                .map_err(|e| match e {
                    LedgerError::DuplicateRole(role) => EngineError::Conflict {
                        document: id.clone(),
                        role,
                    },
                    LedgerError::RoleNotAllowed(role) => EngineError::InvalidRole {
                        document: id.clone(),
                        role: role.to_string(),
                    },
                })?;

            let mut audit = vec![self.audit_record(id, Some(caller), AuditAction::Signed { role })?];

            let completion = if self.auto_complete {
                if let Some(record) = self.complete_if_ready(&mut next)? {
                    audit.push(record);
                }
                Some(self.report(&next))
            } else {
                None
            };

            self.commit(&next, &audit, || format!("signing document {id} as {role}"))?;

            tracing::info!(
                document = %id,
                role = %role,
                signer = %caller.user_id,
                status = %next.status,
                "signature recorded"
            );

            Ok(SignConfirmation {
                document_id: id.clone(),
                role,
                message: format!("Signature from {role} added successfully"),
                completion,
            })
        })
    }

    /// Moves `document` to completed when every required role has signed and
    /// it is still open. Returns the audit record for the transition.
    fn complete_if_ready(&self, document: &mut Document) -> Result<Option<AuditRecord>, EngineError> {
        let ready = document
            .signatures
            .is_complete(self.policy.as_ref(), document.doc_type);

        if !ready || !document.status.can_transition_to(DocumentStatus::Completed) {
            return Ok(None);
        }

        document.status = DocumentStatus::Completed;
        tracing::info!(document = %document.id, "all required roles signed, document completed");

        self.audit_record(&document.id, None, AuditAction::Completed)
            .map(Some)
    }

    fn report(&self, document: &Document) -> CompletionReport {
        let policy = self.policy.as_ref();

        CompletionReport {
            document_id: document.id.clone(),
            is_complete: document.signatures.is_complete(policy, document.doc_type),
            signed_roles: document.signatures.signed_roles(),
            missing_roles: document.signatures.unsigned_roles(policy, document.doc_type),
            status: document.status,
        }
    }

    /// Evaluate completion and transition to completed when satisfied.
    /// Idempotent: an already completed or cancelled document is never rewritten.
    pub fn check_completion(&self, id: &DocumentId) -> Result<CompletionReport, EngineError> {
        self.locks.with_document(id, || {
            let mut document = self.load(id)?;

            if let Some(record) = self.complete_if_ready(&mut document)? {
                self.commit(&document, &[record], || format!("completing document {id}"))?;
            }

            Ok(self.report(&document))
        })
    }

    /// Document with the required roles split into signed and unsigned.
    pub fn document_signing_status(&self, id: &DocumentId) -> Result<SigningStatus, EngineError> {
        let document = self.load(id)?;

        Ok(SigningStatus {
            signed_roles: document.signatures.signed_roles(),
            unsigned_roles: document
                .signatures
                .unsigned_roles(self.policy.as_ref(), document.doc_type),
            document,
        })
    }

    /// Roles still waiting to sign.
    pub fn request_signatures(&self, id: &DocumentId) -> Result<PendingSignatures, EngineError> {
        let status = self.document_signing_status(id)?;

        tracing::info!(
            document = %id,
            pending = status.unsigned_roles.len(),
            "signature request"
        );

        Ok(PendingSignatures {
            document_id: id.clone(),
            complete: status.unsigned_roles.is_empty(),
            pending_roles: status.unsigned_roles,
        })
    }

    /// Manual status override by the document owner or an administrator.
    /// Completion is never set by hand; see [`SigningEngine::check_completion`].
    pub fn update_status(
        &self,
        id: &DocumentId,
        status: DocumentStatus,
        caller: &Caller,
    ) -> Result<Document, EngineError> {
        self.locks.with_document(id, || {
            let mut document = self.load(id)?;

            if !caller.role.is_admin() && document.uploaded_by != caller.user_id {
                return Err(EngineError::NotOwner {
                    document: id.clone(),
                    caller: caller.user_id.to_string(),
                });
            }

            let from = document.status;
            if status == DocumentStatus::Completed || !from.can_transition_to(status) {
                return Err(EngineError::InvalidTransition {
                    document: id.clone(),
                    from,
                    to: status,
                });
            }

            document.status = status;
            let record =
                self.audit_record(id, Some(caller), AuditAction::StatusChanged { from, to: status })?;
            self.commit(&document, &[record], || {
                format!("moving document {id} from {from} to {status}")
            })?;

            tracing::info!(document = %id, %from, to = %status, by = %caller.user_id, "status changed");
            Ok(document)
        })
    }

    pub fn cancel_document(&self, id: &DocumentId, caller: &Caller) -> Result<Document, EngineError> {
        self.update_status(id, DocumentStatus::Cancelled, caller)
    }

    /// Administrators see every document; everyone else sees documents they
    /// uploaded or have signed.
    pub fn list_documents(&self, caller: &Caller) -> Result<Vec<Document>, EngineError> {
        let documents = self
            .store
            .documents()
            .map_err(|e| EngineError::storage("listing documents", e))?;

        if caller.role.is_admin() {
            return Ok(documents);
        }
        Ok(documents
            .into_iter()
            .filter(|doc| doc.involves(&caller.user_id))
            .collect())
    }

    pub fn audit_trail(&self, id: &DocumentId) -> Result<Vec<AuditRecord>, EngineError> {
        self.load(id)?;
        self.store
            .audit_trail(id)
            .map_err(|e| EngineError::storage(format!("reading audit trail of {id}"), e))
    }
}

fn ensure_open(document: &Document) -> Result<(), EngineError> {
    if document.status.is_terminal() {
        return Err(EngineError::DocumentClosed {
            document: document.id.clone(),
            status: document.status,
        });
    }
    Ok(())
}
