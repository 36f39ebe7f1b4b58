//! # Domain Entities
//!
//! Actions, notifications and the side effects a unit of work can queue.

use crate::errors::ContractError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name, PermissionLevel, TimePointSec};

// =============================================================================
// USAGE KIND
// =============================================================================

/// Which usage counter an address book operation increments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageKind {
    Emplace,
    Modify,
    Erase,
}

impl UsageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Emplace => "emplace",
            Self::Modify => "modify",
            Self::Erase => "erase",
        }
    }
}

impl std::fmt::Display for UsageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ACTION
// =============================================================================

/// A call to a contract (or gateway) action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Account the action is addressed to.
    pub account: Name,
    /// Action name.
    pub name: Name,
    /// Authorizations declared by the caller.
    pub authorization: Vec<PermissionLevel>,
    /// bincode-packed arguments.
    pub data: Vec<u8>,
}

impl Action {
    /// Build an action, packing `payload` as its arguments.
    pub fn new<T: Serialize>(
        account: Name,
        name: Name,
        authorization: Vec<PermissionLevel>,
        payload: &T,
    ) -> Result<Self, ContractError> {
        let data = bincode::serialize(payload).map_err(|e| ContractError::Encode {
            action: name,
            reason: e.to_string(),
        })?;
        Ok(Self {
            account,
            name,
            authorization,
            data,
        })
    }

    /// Unpack the arguments.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ContractError> {
        bincode::deserialize(&self.data).map_err(|e| ContractError::Decode {
            action: self.name,
            reason: e.to_string(),
        })
    }

    /// Returns true if `actor` appears among the declared authorizations.
    #[must_use]
    pub fn is_authorized_by(&self, actor: Name) -> bool {
        self.authorization.iter().any(|level| level.actor == actor)
    }
}

// =============================================================================
// NOTIFICATION
// =============================================================================

/// Read-only copy of an action delivered to an account outside the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Name,
    /// Account that executed the action.
    pub contract: Name,
    pub action: Name,
    pub data: Vec<u8>,
}

impl Notification {
    #[must_use]
    pub fn of(recipient: Name, action: &Action) -> Self {
        Self {
            recipient,
            contract: action.account,
            action: action.name,
            data: action.data.clone(),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ContractError> {
        bincode::deserialize(&self.data).map_err(|e| ContractError::Decode {
            action: self.action,
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// QUEUED EFFECTS
// =============================================================================

/// Value transfer queued for the transfer gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Token contract executing the transfer.
    pub token_contract: Name,
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

/// Counter increment queued for the usage counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCall {
    /// Contract asking for the increment.
    pub caller: Name,
    pub user: Name,
    pub kind: UsageKind,
}

/// Result of a committed unit of work.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionReceipt {
    /// Contract the original action targeted.
    pub contract: Name,
    pub action: Name,
    /// Lines printed by contracts, in execution order.
    pub console: Vec<String>,
    /// Notifications delivered after commit.
    pub notifications: Vec<Notification>,
    /// Transfers accepted by the gateway.
    pub transfers: Vec<TransferRequest>,
    /// Counter increments accepted by the usage counter.
    pub usage: Vec<UsageCall>,
    /// Number of inline actions executed.
    pub inline_actions: usize,
    pub executed_at: TimePointSec,
}

impl ActionReceipt {
    /// Notifications addressed to `recipient`.
    pub fn notifications_for(&self, recipient: Name) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(move |n| n.recipient == recipient)
    }
}

// =============================================================================
// TESTS
// =============================================================================
