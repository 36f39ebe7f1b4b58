//! # Action Schema
//!
//! Names and argument payloads of every action the host understands.
//! Payloads travel bincode-packed inside `Action::data`.
//!
//! ## Action Surface
//!
//! | Contract | Action | Arguments | Authorization |
//! |----------|--------|-----------|---------------|
//! | addressbook | `upsert` | [`UpsertPayload`] | `user` |
//! | addressbook | `erase` | [`ErasePayload`] | `user` |
//! | addressbook | `notify` | [`NotifyPayload`] | the contract itself |
//! | hodl | `party` | [`PartyPayload`] | `hodler` |
//! | token gateway | `transfer` | [`TransferPayload`] | `from` |
//! | usage counter | `count` | [`CountPayload`] | the calling contract |

use crate::domain::entities::UsageKind;
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name};

// =============================================================================
// ACTION NAMES
// =============================================================================

/// Action names.
pub mod actions {
    use shared_types::Name;

    /// Insert or update an address book record.
    pub const UPSERT: Name = Name::from_static("upsert");
    /// Remove an address book record.
    pub const ERASE: Name = Name::from_static("erase");
    /// Relay a message to a user.
    pub const NOTIFY: Name = Name::from_static("notify");
    /// Release escrowed funds.
    pub const PARTY: Name = Name::from_static("party");
    /// Move value between accounts.
    pub const TRANSFER: Name = Name::from_static("transfer");
    /// Increment a usage counter.
    pub const COUNT: Name = Name::from_static("count");
}

/// Default account names of the deployed contracts and gateways.
pub mod accounts {
    use shared_types::Name;

    /// Token contract reached through the transfer gateway.
    pub const TOKEN: Name = Name::from_static("eosio.token");
    /// Usage counter reached through the usage gateway.
    pub const USAGE_COUNTER: Name = Name::from_static("abcounter");
    /// Address book deployment.
    pub const ADDRESSBOOK: Name = Name::from_static("addressbook");
    /// Escrow deployment.
    pub const HODL: Name = Name::from_static("hodl");
}

// =============================================================================
// ADDRESS BOOK
// =============================================================================

/// Arguments of `upsert`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertPayload {
    /// Record owner and primary key.
    pub user: Name,
    pub first_name: String,
    pub last_name: String,
    pub age: u64,
    pub street: String,
    pub city: String,
    pub state: String,
}

/// Arguments of `erase`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErasePayload {
    /// Record owner.
    pub user: Name,
}

/// Arguments of `notify`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyPayload {
    /// Recipient of the message.
    pub user: Name,
    /// Message text.
    pub msg: String,
}

// =============================================================================
// ESCROW
// =============================================================================

/// Arguments of `party`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyPayload {
    /// Holder claiming their balance.
    pub hodler: Name,
}

// =============================================================================
// GATEWAYS
// =============================================================================

/// Arguments of the token `transfer`. The escrow receives these as a
/// notification when it is the sender or the recipient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPayload {
    pub from: Name,
    pub to: Name,
    pub quantity: Asset,
    pub memo: String,
}

/// Arguments of the usage counter `count`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountPayload {
    /// User whose counter is incremented.
    pub user: Name,
    /// Which counter.
    pub kind: UsageKind,
}

// =============================================================================
// TESTS
// =============================================================================
