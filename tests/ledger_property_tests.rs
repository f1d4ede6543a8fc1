//! Property-based tests for the signature ledger and completion rules
//!
//! Completion is derived entirely from the set of signed roles, so these
//! properties check the derivation against arbitrary signing sequences rather
//! than hand-picked cases.
//!
//! Not covered here: persistence and locking (see scenarios and concurrency).

use document_cosign::{
    document::{DocumentType, UserId},
    error::LedgerError,
    ledger::{SignatureEntry, SignatureLedger},
    policy::{RolePolicy, RoleSet, StandardPolicy},
    role::{CallerRole, SigningRole},
};
use proptest::prelude::*;

/// Strategy over every role, including out-of-range witness slots
fn role_strategy() -> impl Strategy<Value = SigningRole> {
    prop_oneof![
        Just(SigningRole::Notary),
        Just(SigningRole::Affiant),
        (0u8..=4).prop_map(SigningRole::Witness),
        Just(SigningRole::Grantor),
        Just(SigningRole::Grantee),
        Just(SigningRole::OtherSigner),
    ]
}

fn doc_type_strategy() -> impl Strategy<Value = DocumentType> {
    prop_oneof![
        Just(DocumentType::Affidavit),
        Just(DocumentType::Deed),
        Just(DocumentType::Contract),
        Just(DocumentType::PowerOfAttorney),
    ]
}

fn caller_strategy() -> impl Strategy<Value = CallerRole> {
    prop_oneof![
        Just(CallerRole::Admin),
        Just(CallerRole::SuperAdmin),
        Just(CallerRole::Notary),
        Just(CallerRole::User),
    ]
}

fn entry(role: SigningRole, n: usize) -> SignatureEntry {
    SignatureEntry::new(role, UserId::from(format!("user_{n}")), format!("sig_{n}"))
}

proptest! {
    /// Property: whatever the sequence, a role holds at most one entry and the
    /// first successful put for a role is the one kept.
    #[test]
    fn prop_at_most_one_entry_per_role(roles in prop::collection::vec(role_strategy(), 0..40)) {
        let mut ledger = SignatureLedger::new();
        let mut accepted = Vec::new();

        for (n, role) in roles.iter().enumerate() {
            match ledger.put(entry(*role, n)) {
                Ok(()) => accepted.push((*role, n)),
                Err(LedgerError::DuplicateRole(r)) => {
                    prop_assert_eq!(r, *role);
                    prop_assert!(accepted.iter().any(|(a, _)| a == role));
                }
                Err(LedgerError::RoleNotAllowed(r)) => {
                    prop_assert!(!r.is_enumerated());
                }
            }
        }

        prop_assert_eq!(ledger.len(), accepted.len());
        for (role, n) in accepted {
            let kept = ledger.get(role).map(|e| e.signature.clone());
            prop_assert_eq!(kept, Some(format!("sig_{n}")));
        }
    }

    /// Property: completion is exactly the subset test, and signed/unsigned
    /// partition the required set.
    #[test]
    fn prop_completion_is_subset_of_signed(
        doc_type in doc_type_strategy(),
        roles in prop::collection::vec(role_strategy(), 0..20),
    ) {
        let policy = StandardPolicy;
        let mut ledger = SignatureLedger::new();
        for (n, role) in roles.into_iter().enumerate() {
            let _ = ledger.put(entry(role, n));
        }

        let required = policy.required_roles(doc_type);
        let signed = ledger.signed_roles();
        let unsigned = ledger.unsigned_roles(&policy, doc_type);

        prop_assert_eq!(ledger.is_complete(&policy, doc_type), required.is_subset(&signed));
        prop_assert_eq!(ledger.is_complete(&policy, doc_type), unsigned.is_empty());

        let signed_required: RoleSet = signed.intersection(&required).copied().collect();
        prop_assert!(unsigned.is_disjoint(&signed_required));
        let union: RoleSet = unsigned.union(&signed_required).copied().collect();
        prop_assert_eq!(union, required);
    }

    /// Property: authorization depends only on the role class, so both witness
    /// slots are always granted together.
    #[test]
    fn prop_witness_slots_share_authorization(caller in caller_strategy()) {
        let policy = StandardPolicy;
        prop_assert_eq!(
            policy.permits(caller, SigningRole::Witness(1)),
            policy.permits(caller, SigningRole::Witness(2))
        );
    }

    /// Property: parsing accepts exactly the rendered names of enumerated roles.
    #[test]
    fn prop_role_names_round_trip(role in role_strategy()) {
        let parsed = role.to_string().parse::<SigningRole>();
        if role.is_enumerated() {
            prop_assert_eq!(parsed, Ok(role));
        } else {
            prop_assert!(parsed.is_err());
        }
    }
}
