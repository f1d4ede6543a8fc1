//! Append-only audit trail
//!
//! Records are never mutated or removed. Ordering is append order, which the
//! store preserves through monotonically increasing record ids.
use crate::document::{DocumentId, DocumentStatus, UserId};
use crate::role::SigningRole;
use crate::timestamp::TimeStamp;
use std::fmt;

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub enum AuditAction {
    #[n(0)]
    Signed {
        #[n(0)]
        role: SigningRole,
    },
    #[n(1)]
    Completed,
    #[n(2)]
    StatusChanged {
        #[n(0)]
        from: DocumentStatus,
        #[n(1)]
        to: DocumentStatus,
    },
    #[n(3)]
    SignedContentAttached {
        #[n(0)]
        content_hash: String,
    },
}

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct AuditRecord {
    #[n(0)]
    pub id: u64,
    #[n(1)]
    pub document_id: DocumentId,
    #[n(2)]
    pub user_id: Option<UserId>, // None for engine-initiated transitions
    #[n(3)]
    pub timestamp: TimeStamp,
    #[n(4)]
    pub action: AuditAction,
}

impl AuditRecord {
    pub fn new(id: u64, document_id: DocumentId, user_id: Option<UserId>, action: AuditAction) -> Self {
        Self {
            id,
            document_id,
            user_id,
            timestamp: TimeStamp::new(),
            action,
        }
    }

    pub fn role(&self) -> Option<SigningRole> {
        match self.action {
            AuditAction::Signed { role } => Some(role),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Signed { role } => write!(f, "signed as {role}"),
            AuditAction::Completed => f.write_str("completed"),
            AuditAction::StatusChanged { from, to } => write!(f, "status {from} -> {to}"),
            AuditAction::SignedContentAttached { content_hash } => {
                write!(f, "signed content {content_hash} attached")
            }
        }
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = self.user_id.as_ref().map_or("engine", |u| u.as_str());
        write!(f, "[{}] {} {}: {}", self.timestamp, self.document_id, who, self.action)
    }
}
