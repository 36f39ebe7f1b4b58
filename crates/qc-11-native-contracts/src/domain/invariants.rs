//! # Domain Invariants
//!
//! Business rules shared by the contracts and checked before any table write.

use crate::errors::ContractError;
use shared_types::{Asset, Name, Symbol, TimePointSec};

/// Invariant: deposits are accepted strictly before the deadline.
pub fn invariant_deposit_window(
    now: TimePointSec,
    deadline: TimePointSec,
) -> Result<(), ContractError> {
    if now >= deadline {
        return Err(ContractError::DeadlinePassed { deadline, now });
    }
    Ok(())
}

/// Invariant: withdrawals are allowed strictly after the deadline.
pub fn invariant_release_window(
    now: TimePointSec,
    deadline: TimePointSec,
) -> Result<(), ContractError> {
    if now <= deadline {
        return Err(ContractError::TooEarly { deadline, now });
    }
    Ok(())
}

/// Invariant: a deposit is a positive, valid quantity of the accepted symbol.
pub fn invariant_deposit_quantity(quantity: &Asset, accepted: Symbol) -> Result<(), ContractError> {
    if quantity.amount <= 0 || !quantity.is_valid() {
        return Err(ContractError::InvalidAmount {
            quantity: quantity.to_string(),
        });
    }
    if quantity.symbol != accepted {
        return Err(ContractError::WrongDenomination {
            expected: accepted,
            got: quantity.symbol,
        });
    }
    Ok(())
}

/// Invariant: a stored balance is never zero or negative.
#[must_use]
pub fn invariant_balance_positive(funds: &Asset) -> bool {
    funds.amount > 0
}

/// A transfer is a deposit into `receiver` only when it arrives from
/// someone else.
#[must_use]
pub fn is_incoming_transfer(receiver: Name, from: Name, to: Name) -> bool {
    to == receiver && from != receiver
}
