//! # Error Types
//!
//! All error types for native contract execution.
//!
//! Every error aborts the whole unit of work: the host undoes all table
//! mutations and discards queued side effects before reporting it.

use shared_types::{Name, Symbol, TimePointSec, TypeError};
use thiserror::Error;

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors that reject an action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// The action was not authorized by the required account.
    #[error("missing authority of {account}")]
    Unauthorized { account: Name },

    /// Mutation or deletion target is absent.
    #[error("{0}")]
    NotFound(String),

    /// Deposit arrived at or after the deadline.
    #[error("deposits closed at {deadline}, now {now}")]
    DeadlinePassed {
        deadline: TimePointSec,
        now: TimePointSec,
    },

    /// Deposit quantity is zero or negative.
    #[error("quantity must be positive, got {quantity}")]
    InvalidAmount { quantity: String },

    /// Deposit is not in the accepted denomination.
    #[error("wrong denomination: expected {expected}, got {got}")]
    WrongDenomination { expected: Symbol, got: Symbol },

    /// Withdrawal attempted at or before the deadline.
    #[error("funds are locked until {deadline}, now {now}")]
    TooEarly {
        deadline: TimePointSec,
        now: TimePointSec,
    },

    /// Withdrawal attempted with no balance row.
    #[error("{holder} has nothing to claim")]
    NothingToClaim { holder: Name },

    /// Table access failed.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Asset arithmetic or value error.
    #[error("asset error: {0}")]
    Asset(#[from] TypeError),

    /// Action arguments could not be packed.
    #[error("cannot encode {action} arguments: {reason}")]
    Encode { action: Name, reason: String },

    /// Action arguments did not decode.
    #[error("cannot decode {action} arguments: {reason}")]
    Decode { action: Name, reason: String },

    /// A queued side effect was refused by its gateway.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// No contract is deployed on the target account.
    #[error("no contract deployed on {0}")]
    UnknownContract(Name),

    /// The contract does not implement the action.
    #[error("{contract} has no action {action}")]
    UnknownAction { contract: Name, action: Name },

    /// Inline action chain nested too deeply.
    #[error("inline action depth exceeded: {depth} > {max}")]
    InlineDepthExceeded { depth: usize, max: usize },

    /// Too many side effects queued by one unit of work.
    #[error("too many pending effects: limit {max}")]
    TooManyEffects { max: usize },

    /// Configuration rejected by `validate()`.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ContractError {
    /// Returns true if the action was rejected for missing authority.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Human-readable reason carried by the rejected call.
    #[must_use]
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// TABLE ERRORS
// =============================================================================

/// Errors from the keyed table store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// `emplace` on a key that already has a row.
    #[error("duplicate primary key {key} in {table}/{scope}")]
    DuplicatePrimaryKey { table: Name, scope: Name, key: u64 },

    /// `modify` / `erase` on a key with no row.
    #[error("no row with primary key {key} in {table}/{scope}")]
    RowNotFound { table: Name, scope: Name, key: u64 },

    /// A `modify` callback changed the primary key.
    #[error("updater cannot change primary key ({before} -> {after})")]
    PrimaryKeyChanged { before: u64, after: u64 },

    /// Row could not be packed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Stored bytes could not be unpacked.
    #[error("decode error: {0}")]
    Decode(String),

    /// `begin_session` while a session is open.
    #[error("undo session already active")]
    SessionActive,
}

// =============================================================================
// GATEWAY ERRORS
// =============================================================================

/// Errors reported by external collaborators (transfer, usage counter).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Sender balance too low.
    #[error("{account} overdrawn: required {required}, available {available}")]
    InsufficientFunds {
        account: Name,
        required: String,
        available: String,
    },

    /// Transfer quantity rejected.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Caller may not use this gateway.
    #[error("caller {caller} not authorized")]
    Unauthorized { caller: Name },

    /// Gateway could not be reached or refused the request.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TESTS
// =============================================================================
