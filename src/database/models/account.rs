use serde::{Deserialize, Serialize};

use crate::types::{ClientId, Identity, Role};

/// Local account linked to an identity-provider subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub identity: Identity,
    /// `None` until an administrator assigns one
    pub role: Option<Role>,
    /// Set when the account owns a client record
    pub client_id: Option<ClientId>,
    /// Set when the account owns a freelancer profile
    pub is_freelancer: bool,
}

impl Account {
    /// Fresh account with no role and no profiles
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            role: None,
            client_id: None,
            is_freelancer: false,
        }
    }
}

/// Outcome of an idempotent create: the record, and whether this call made it
#[derive(Debug, Clone, PartialEq)]
pub struct Provisioned<T> {
    pub record: T,
    pub created: bool,
}

impl<T> Provisioned<T> {
    pub fn created(record: T) -> Self {
        Self { record, created: true }
    }

    pub fn existing(record: T) -> Self {
        Self { record, created: false }
    }
}
