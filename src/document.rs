//! Document records and their status machine
use crate::error::ParseError;
use crate::ledger::SignatureLedger;
use crate::timestamp::TimeStamp;
use crate::utils;
use std::fmt;
use std::str::FromStr;

/// bech32 encoded uuid7 with a `doc_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub struct DocumentId(#[n(0)] String);

/// Opaque user identifier as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub struct UserId(#[n(0)] String);

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    #[n(0)]
    Affidavit,
    #[n(1)]
    Deed,
    #[n(2)]
    Contract,
    #[n(3)]
    PowerOfAttorney,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    ActionRequired,
    #[n(2)]
    Completed,
    #[n(3)]
    Cancelled,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Document {
    #[n(0)]
    pub id: DocumentId,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub doc_type: DocumentType,
    #[n(3)]
    pub status: DocumentStatus,
    #[n(4)]
    pub uploaded_by: UserId,
    #[n(5)]
    pub upload_date: TimeStamp,
    #[n(6)]
    pub content_ref: String,
    #[n(7)]
    pub content_hash: String,
    #[n(8)]
    pub signed_content_ref: Option<String>,
    #[n(9)]
    pub signed_content_hash: Option<String>,
    #[n(10)]
    pub signatures: SignatureLedger,
}

impl DocumentId {
    pub fn generate() -> anyhow::Result<Self> {
        Ok(Self(utils::new_uuid_to_bech32("doc_")?))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl UserId {
    pub fn generate() -> anyhow::Result<Self> {
        Ok(Self(utils::new_uuid_to_bech32("user_")?))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl DocumentType {
    pub fn all() -> [DocumentType; 4] {
        [
            DocumentType::Affidavit,
            DocumentType::Deed,
            DocumentType::Contract,
            DocumentType::PowerOfAttorney,
        ]
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentType::Affidavit => "affidavit",
            DocumentType::Deed => "deed",
            DocumentType::Contract => "contract",
            DocumentType::PowerOfAttorney => "power_of_attorney",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::all()
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| ParseError::DocumentType(s.to_string()))
    }
}

impl DocumentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DocumentStatus::Completed | DocumentStatus::Cancelled)
    }

    /// pending -> action_required, {pending, action_required} -> {completed, cancelled}.
    /// Terminal states never move.
    pub fn can_transition_to(&self, next: DocumentStatus) -> bool {
        use DocumentStatus::*;

        matches!(
            (self, next),
            (Pending, ActionRequired)
                | (Pending | ActionRequired, Completed)
                | (Pending | ActionRequired, Cancelled)
        )
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::ActionRequired => "action_required",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DocumentStatus::Pending),
            "action_required" => Ok(DocumentStatus::ActionRequired),
            "completed" => Ok(DocumentStatus::Completed),
            "cancelled" => Ok(DocumentStatus::Cancelled),
            _ => Err(ParseError::DocumentStatus(s.to_string())),
        }
    }
}

impl Document {
    /// Fresh document in `pending` with an empty ledger.
    pub fn new(
        id: DocumentId,
        name: String,
        doc_type: DocumentType,
        uploaded_by: UserId,
        content_ref: String,
        content_hash: String,
    ) -> Self {
        Self {
            id,
            name,
            doc_type,
            status: DocumentStatus::Pending,
            uploaded_by,
            upload_date: TimeStamp::new(),
            content_ref,
            content_hash,
            signed_content_ref: None,
            signed_content_hash: None,
            signatures: SignatureLedger::new(),
        }
    }

    /// Owner, or holder of any signature on this document.
    pub fn involves(&self, user: &UserId) -> bool {
        self.uploaded_by == *user || self.signatures.entries().any(|e| e.signer == *user)
    }
}
