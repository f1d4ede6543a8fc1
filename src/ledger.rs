//! Per-document signature ledger
//!
//! Maps each signing role to the single signature collected for it. Entries are
//! only ever added through [`SignatureLedger::put`]; there is no update or
//! removal path.
use crate::document::{DocumentType, UserId};
use crate::error::LedgerError;
use crate::policy::{RolePolicy, RoleSet};
use crate::role::SigningRole;
use crate::timestamp::TimeStamp;
use std::collections::BTreeMap;

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct SignatureEntry {
    #[n(0)]
    pub role: SigningRole,
    #[n(1)]
    pub signer: UserId,
    #[n(2)]
    pub signature: String,
    #[n(3)]
    pub signed_at: TimeStamp,
}

#[derive(Debug, Default, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct SignatureLedger {
    #[n(0)]
    entries: BTreeMap<SigningRole, SignatureEntry>,
}

impl SignatureEntry {
    pub fn new(role: SigningRole, signer: UserId, signature: String) -> Self {
        Self {
            role,
            signer,
            signature,
            signed_at: TimeStamp::new(),
        }
    }
}

impl SignatureLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, entry: SignatureEntry) -> Result<(), LedgerError> {
        let role = entry.role;
        if !role.is_enumerated() {
            return Err(LedgerError::RoleNotAllowed(role));
        }
        if self.entries.contains_key(&role) {
            return Err(LedgerError::DuplicateRole(role));
        }

        self.entries.insert(role, entry);
        Ok(())
    }

    pub fn get(&self, role: SigningRole) -> Option<&SignatureEntry> {
        self.entries.get(&role)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SignatureEntry> {
        self.entries.values()
    }

    pub fn signed_roles(&self) -> RoleSet {
        self.entries.keys().copied().collect()
    }

    /// Required roles for `doc_type` that have not signed yet. Roles the type
    /// never needed are not reported.
    pub fn unsigned_roles(&self, policy: &dyn RolePolicy, doc_type: DocumentType) -> RoleSet {
        policy
            .required_roles(doc_type)
            .into_iter()
            .filter(|role| !self.entries.contains_key(role))
            .collect()
    }

    /// Subset test: signatures beyond the required set do not block completion.
    pub fn is_complete(&self, policy: &dyn RolePolicy, doc_type: DocumentType) -> bool {
        policy
            .required_roles(doc_type)
            .iter()
            .all(|role| self.entries.contains_key(role))
    }
}
