//! Caller identity
//!
//! The engine trusts whatever the identity provider resolves; it never
//! re-validates a caller.
use crate::document::UserId;
use crate::role::CallerRole;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: CallerRole,
}

impl Caller {
    pub fn new(user_id: UserId, role: CallerRole) -> Self {
        Self { user_id, role }
    }
}

pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential. `None` means the credential is unknown.
    fn resolve(&self, credential: &str) -> Option<Caller>;
}

/// Fixed credential table, for tests and single-node setups.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    callers: HashMap<String, Caller>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, credential: impl Into<String>, caller: Caller) -> Self {
        self.callers.insert(credential.into(), caller);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, credential: &str) -> Option<Caller> {
        self.callers.get(credential).cloned()
    }
}
