//! Role policy: which roles a document needs, and who may act in which role.
//!
//! The two questions are answered independently so a deployment can change
//! the roles a document type requires without touching authorization, and the
//! other way round. The engine receives its policy at construction time.
use crate::document::DocumentType;
use crate::role::{CallerRole, RoleKind, SigningRole};
use std::collections::BTreeSet;

pub type RoleSet = BTreeSet<SigningRole>;

pub trait RolePolicy: Send + Sync {
    /// Roles that must all be signed before a document of this type is complete.
    fn required_roles(&self, doc_type: DocumentType) -> RoleSet;

    /// Role classes a caller may sign as. A witness grant covers every slot.
    fn permitted_roles(&self, caller: CallerRole) -> BTreeSet<RoleKind>;

    fn permits(&self, caller: CallerRole, role: SigningRole) -> bool {
        self.permitted_roles(caller).contains(&role.kind())
    }
}

/// Default notarial policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl RolePolicy for StandardPolicy {
    fn required_roles(&self, doc_type: DocumentType) -> RoleSet {
        match doc_type {
            DocumentType::Affidavit => RoleSet::from([
                SigningRole::Affiant,
                SigningRole::Notary,
                SigningRole::Witness(1),
                SigningRole::Witness(2),
                SigningRole::Grantor,
            ]),
            DocumentType::Deed | DocumentType::Contract | DocumentType::PowerOfAttorney => {
                RoleSet::from([
                    SigningRole::Notary,
                    SigningRole::Grantor,
                    SigningRole::Grantee,
                    SigningRole::Witness(1),
                    SigningRole::Witness(2),
                ])
            }
        }
    }

    fn permitted_roles(&self, caller: CallerRole) -> BTreeSet<RoleKind> {
        match caller {
            CallerRole::Notary => BTreeSet::from([RoleKind::Notary]),
            CallerRole::User => BTreeSet::from([
                RoleKind::Affiant,
                RoleKind::Witness,
                RoleKind::Grantor,
                RoleKind::Grantee,
                RoleKind::OtherSigner,
            ]),
            CallerRole::Admin | CallerRole::SuperAdmin => RoleKind::all().into_iter().collect(),
        }
    }
}
