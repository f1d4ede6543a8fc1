//! Signing roles and caller roles
//!
//! A [`SigningRole`] is the capacity in which a party signs a document. Witness
//! slots carry their instance index, so `witness_1` and `witness_2` are distinct
//! ledger keys while still sharing the [`RoleKind::Witness`] authorization class.
use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// Number of witness slots a document can carry.
pub const WITNESS_SLOTS: u8 = 2;

#[derive(
    minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum SigningRole {
    #[n(0)]
    Notary,
    #[n(1)]
    Affiant,
    #[n(2)]
    Witness(#[n(0)] u8),
    #[n(3)]
    Grantor,
    #[n(4)]
    Grantee,
    #[n(5)]
    OtherSigner,
}

/// Authorization class of a signing role, ignoring the witness instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoleKind {
    Notary,
    Affiant,
    Witness,
    Grantor,
    Grantee,
    OtherSigner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, minicbor::Encode, minicbor::Decode)]
pub enum CallerRole {
    #[n(0)]
    Admin,
    #[n(1)]
    SuperAdmin,
    #[n(2)]
    Notary,
    #[n(3)]
    User,
}

impl SigningRole {
    /// Every member of the enumerated role set, witness slots expanded.
    pub fn all() -> Vec<SigningRole> {
        let mut roles = vec![SigningRole::Notary, SigningRole::Affiant];
        roles.extend((1..=WITNESS_SLOTS).map(SigningRole::Witness));
        roles.extend([
            SigningRole::Grantor,
            SigningRole::Grantee,
            SigningRole::OtherSigner,
        ]);
        roles
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            SigningRole::Notary => RoleKind::Notary,
            SigningRole::Affiant => RoleKind::Affiant,
            SigningRole::Witness(_) => RoleKind::Witness,
            SigningRole::Grantor => RoleKind::Grantor,
            SigningRole::Grantee => RoleKind::Grantee,
            SigningRole::OtherSigner => RoleKind::OtherSigner,
        }
    }

    /// False only for witness slots outside `1..=WITNESS_SLOTS`.
    pub fn is_enumerated(&self) -> bool {
        match self {
            SigningRole::Witness(slot) => (1..=WITNESS_SLOTS).contains(slot),
            _ => true,
        }
    }
}

impl fmt::Display for SigningRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningRole::Notary => f.write_str("notary"),
            SigningRole::Affiant => f.write_str("affiant"),
            SigningRole::Witness(slot) => write!(f, "witness_{slot}"),
            SigningRole::Grantor => f.write_str("grantor"),
            SigningRole::Grantee => f.write_str("grantee"),
            SigningRole::OtherSigner => f.write_str("other_signer"),
        }
    }
}

impl FromStr for SigningRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s {
            "notary" => SigningRole::Notary,
            "affiant" => SigningRole::Affiant,
            "grantor" => SigningRole::Grantor,
            "grantee" => SigningRole::Grantee,
            "other_signer" => SigningRole::OtherSigner,
            // only the canonical slot names, so "witness_01" is not witness_1
            other => (1..=WITNESS_SLOTS)
                .map(SigningRole::Witness)
                .find(|slot| slot.to_string() == other)
                .ok_or_else(|| ParseError::SigningRole(s.to_string()))?,
        };

        Ok(role)
    }
}

impl RoleKind {
    pub fn all() -> [RoleKind; 6] {
        [
            RoleKind::Notary,
            RoleKind::Affiant,
            RoleKind::Witness,
            RoleKind::Grantor,
            RoleKind::Grantee,
            RoleKind::OtherSigner,
        ]
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoleKind::Notary => "notary",
            RoleKind::Affiant => "affiant",
            RoleKind::Witness => "witness",
            RoleKind::Grantor => "grantor",
            RoleKind::Grantee => "grantee",
            RoleKind::OtherSigner => "other_signer",
        };
        f.write_str(name)
    }
}

impl CallerRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, CallerRole::Admin | CallerRole::SuperAdmin)
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallerRole::Admin => "admin",
            CallerRole::SuperAdmin => "super_admin",
            CallerRole::Notary => "notary",
            CallerRole::User => "user",
        };
        f.write_str(name)
    }
}

impl FromStr for CallerRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(CallerRole::Admin),
            "super_admin" => Ok(CallerRole::SuperAdmin),
            "notary" => Ok(CallerRole::Notary),
            "user" => Ok(CallerRole::User),
            _ => Err(ParseError::CallerRole(s.to_string())),
        }
    }
}
