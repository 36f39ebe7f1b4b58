//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the contract host depends on:
//! - Authorization checks for the running action
//! - Notification delivery to accounts outside the host
//! - Value transfers through the token contract
//! - Usage counter increments
//! - Current time
//!
//! Gateways are only called after the contract logic succeeded; a gateway
//! error undoes the whole unit of work.

use crate::domain::entities::{Notification, TransferRequest, UsageCall};
use crate::errors::{ContractError, GatewayError};
use async_trait::async_trait;
use shared_types::{Name, TimePointSec};

// =============================================================================
// AUTHORIZATION
// =============================================================================

/// Answers whether an account authorized the running action.
pub trait AuthorizationGate: Send + Sync {
    /// Returns true if `account` signed off on the action.
    fn has_auth(&self, account: Name) -> bool;

    /// Fails with `Unauthorized` unless `account` authorized the action.
    fn require_auth(&self, account: Name) -> Result<(), ContractError> {
        if self.has_auth(account) {
            Ok(())
        } else {
            Err(ContractError::Unauthorized { account })
        }
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// Delivers read-only notifications to external accounts.
///
/// Fire-and-forget: delivery happens after commit and cannot fail the
/// unit of work.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn deliver(&self, notification: Notification);
}

// =============================================================================
// TRANSFERS
// =============================================================================

/// Moves value between accounts on behalf of a contract.
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Execute a queued transfer.
    ///
    /// # Errors
    ///
    /// * `InsufficientFunds` - sender cannot cover the quantity
    /// * `InvalidQuantity` - quantity is not positive or not a valid asset
    /// * `Unavailable` - gateway refused the request
    async fn transfer(&self, request: &TransferRequest) -> Result<(), GatewayError>;
}

// =============================================================================
// USAGE COUNTER
// =============================================================================

/// Per-user operation counters kept by a companion contract.
#[async_trait]
pub trait UsageCounter: Send + Sync {
    /// Increment the counter named by `call.kind` for `call.user`.
    ///
    /// # Errors
    ///
    /// * `Unauthorized` - `call.caller` may not touch the counters
    async fn count(&self, call: &UsageCall) -> Result<(), GatewayError>;
}

// =============================================================================
// CLOCK
// =============================================================================

/// Source of the time a unit of work executes at.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimePointSec;
}
