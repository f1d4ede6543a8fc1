use crate::document::{DocumentId, DocumentStatus};
use crate::notary::NotarizationReceipt;
use crate::role::{CallerRole, SigningRole};

/// Stable error classification reported to callers alongside the detail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidRole,
    Forbidden,
    Conflict,
    DocumentClosed,
    InvalidTransition,
    StorageError,
    NotarizationFailed,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("Document {0} not found")]
    NotFound(DocumentId),
    #[error("Invalid signing role '{role}' for document {document}")]
    InvalidRole { document: DocumentId, role: String },
    #[error("User with role '{caller}' is not authorized to sign document {document} as '{role}'")]
    Forbidden {
        document: DocumentId,
        caller: CallerRole,
        role: SigningRole,
    },
    #[error("Caller {caller} may not modify document {document}")]
    NotOwner { document: DocumentId, caller: String },
    #[error("Document {document} has already been signed by {role}")]
    Conflict {
        document: DocumentId,
        role: SigningRole,
    },
    #[error("Document {document} is {status} and accepts no further changes")]
    DocumentClosed {
        document: DocumentId,
        status: DocumentStatus,
    },
    #[error("Document {document} cannot move from {from} to {to}")]
    InvalidTransition {
        document: DocumentId,
        from: DocumentStatus,
        to: DocumentStatus,
    },
    #[error("Document {document} is {status}; signed content needs a completed document")]
    NotCompleted {
        document: DocumentId,
        status: DocumentStatus,
    },
    #[error("Signed content for document {0} has already been attached")]
    SignedContentExists(DocumentId),
    #[error("Storage failure while {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: StorageError,
    },
    #[error("Notarization failed: {0}")]
    NotarizationFailed(String),
    /// The notarizer recorded the content but answered after its bound. The
    /// upload is rolled back; the receipt is kept for reconciliation.
    #[error(
        "Notarization of {content_hash} (blob {reference}) overran after {elapsed:?}; recorded as {receipt}"
    )]
    NotarizationOverrun {
        receipt: NotarizationReceipt,
        content_hash: String,
        reference: String,
        elapsed: std::time::Duration,
    },
    /// A workflow step failed and at least one compensating action failed too.
    #[error("{cause} (compensation also failed: {})", .failures.join("; "))]
    CompensationFailed {
        cause: Box<EngineError>,
        failures: Vec<String>,
    },
    /// The content was notarized but the document row was never written.
    #[error(
        "Document notarized as {receipt} (hash {content_hash}, blob {reference}) but not persisted: {source}"
    )]
    Unreconciled {
        receipt: NotarizationReceipt,
        content_hash: String,
        reference: String,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn storage(context: impl Into<String>, source: StorageError) -> Self {
        EngineError::Storage {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidRole { .. } => ErrorKind::InvalidRole,
            EngineError::Forbidden { .. } | EngineError::NotOwner { .. } => ErrorKind::Forbidden,
            EngineError::Conflict { .. } | EngineError::SignedContentExists(_) => {
                ErrorKind::Conflict
            }
            EngineError::DocumentClosed { .. } => ErrorKind::DocumentClosed,
            EngineError::InvalidTransition { .. } | EngineError::NotCompleted { .. } => {
                ErrorKind::InvalidTransition
            }
            EngineError::Storage { .. } | EngineError::Unreconciled { .. } => {
                ErrorKind::StorageError
            }
            EngineError::NotarizationFailed(_) | EngineError::NotarizationOverrun { .. } => {
                ErrorKind::NotarizationFailed
            }
            EngineError::CompensationFailed { cause, .. } => cause.kind(),
            EngineError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may safely retry. The engine leaves no partial
    /// state behind on these failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::StorageError | ErrorKind::NotarizationFailed
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(String),
    #[error("failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("blob '{0}' does not exist")]
    MissingBlob(String),
    #[error("record '{0}' already exists")]
    Duplicate(String),
    #[error("transaction aborted")]
    Aborted,
    #[error("{0}")]
    Unavailable(String),
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for StorageError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        StorageError::Encode(value.to_string())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Role {0} is not a recognised signing role")]
    RoleNotAllowed(SigningRole),
    #[error("Role {0} has already signed")]
    DuplicateRole(SigningRole),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown signing role '{0}'")]
    SigningRole(String),
    #[error("unknown caller role '{0}'")]
    CallerRole(String),
    #[error("unknown document type '{0}'")]
    DocumentType(String),
    #[error("unknown document status '{0}'")]
    DocumentStatus(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}
