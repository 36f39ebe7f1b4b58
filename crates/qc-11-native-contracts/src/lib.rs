//! # QC-11 Native Contracts - Contract Host Subsystem
//!
//! **Subsystem ID:** 11
//!
//! ## Purpose
//!
//! Hosts natively compiled contracts on a keyed table store and executes
//! their actions as atomic units of work. Two contracts ship with the host:
//!
//! - **Address book**: per-user records with a field-level diff on update,
//!   an age index, owner notifications and a usage counter
//! - **Hodl escrow**: deposits accumulate per denomination until a deadline,
//!   after which each holder withdraws the whole balance
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | No partial writes | `service.rs` - undo session around every unit |
//! | Effects only after success | `service.rs` - outbox flushed after the unit ran |
//! | Inline actions carry only the sender's authority | `service.rs` - `check_inline_authority()` |
//! | Deposits strictly before the deadline | `domain/invariants.rs` - `invariant_deposit_window()` |
//! | Withdrawals strictly after the deadline | `domain/invariants.rs` - `invariant_release_window()` |
//! | Positive deposits in the accepted symbol | `domain/invariants.rs` - `invariant_deposit_quantity()` |
//! | Secondary index in step with rows | `domain/table.rs` - raw layer |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `NotificationChannel` | Deliver read-only notifications to users |
//! | `TransferGateway` | Execute token transfers |
//! | `UsageCounter` | Increment per-user operation counters |
//! | `Clock` | Time a unit of work executes at |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_11_native_contracts::prelude::*;
//!
//! let host = create_test_host()?;
//! let receipt = host.push_action(upsert).await?;
//! for note in &receipt.notifications {
//!     println!("{} <- {}::{}", note.recipient, note.contract, note.action);
//! }
//! ```

// Crate-level lints
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod contracts;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::context::{ActionContext, Outbox};
    pub use crate::domain::entities::{
        Action, ActionReceipt, Notification, TransferRequest, UsageCall, UsageKind,
    };
    pub use crate::domain::table::{
        ChainDatabase, MultiIndex, TableId, TableRow, TableView, UndoSession,
    };

    // Contracts
    pub use crate::contracts::{
        AddressBook, AddressBookConfig, Balance, Contract, Hodl, HodlConfig, Person, PARTY_MEMO,
    };

    // Ports
    pub use crate::ports::inbound::ContractApi;
    pub use crate::ports::outbound::{
        AuthorizationGate, Clock, NotificationChannel, TransferGateway, UsageCounter,
    };

    // Events
    pub use crate::events::{
        accounts, actions, CountPayload, ErasePayload, NotifyPayload, PartyPayload,
        TransferPayload, UpsertPayload,
    };

    // Errors
    pub use crate::errors::{ContractError, GatewayError, TableError};

    // Adapters
    pub use crate::adapters::{
        DeclaredAuthorizations, InMemoryNotificationChannel, InMemoryTokenLedger,
        InMemoryUsageCounter, ManualClock, SystemClock, UsageRecord,
    };

    // Service
    pub use crate::service::{
        create_test_host, ContractHost, HostConfig, HostStats, InMemoryHost,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 11;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Native Contracts";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, 11);
    }

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = HostConfig::default();
        let _ = HodlConfig::default();
        assert_eq!(accounts::HODL.to_string(), "hodl");
    }
}
