//! Who may see and change which entries.
//!
//! Admins act on every entry; everyone else only on entries they created.

use models::entry;
use uuid::Uuid;

use super::domain::Principal;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Row filter applied to list and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(Uuid),
}

impl Scope {
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            Scope::All => None,
            Scope::OwnedBy(id) => Some(*id),
        }
    }

    pub fn contains(&self, entry: &entry::Model) -> bool {
        self.owner().map_or(true, |id| entry.created_by == id)
    }
}

pub trait AccessPolicy: Send + Sync {
    fn scope(&self, principal: &Principal) -> Scope;
    fn authorize(&self, action: Action, resource: &entry::Model, principal: &Principal) -> Decision;
}

/// Owner-or-admin rule, the same for every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnershipPolicy;

impl AccessPolicy for OwnershipPolicy {
    fn scope(&self, principal: &Principal) -> Scope {
        if is_admin(principal) { Scope::All } else { Scope::OwnedBy(principal.user_id) }
    }

    fn authorize(&self, _action: Action, resource: &entry::Model, principal: &Principal) -> Decision {
        if is_admin(principal) || resource.created_by == principal.user_id {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

pub fn is_admin(principal: &Principal) -> bool { principal.is_admin() }

pub fn scope_filter(principal: &Principal) -> Scope { OwnershipPolicy.scope(principal) }

/// `Deny` becomes [`ServiceError::Forbidden`].
pub fn authorize_mutation(principal: &Principal, action: Action, entry: &entry::Model) -> Result<(), ServiceError> {
    match OwnershipPolicy.authorize(action, entry, principal) {
        Decision::Allow => Ok(()),
        Decision::Deny => Err(ServiceError::Forbidden),
    }
}
