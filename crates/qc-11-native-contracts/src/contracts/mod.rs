//! # Native Contracts
//!
//! Contracts compiled into the host. Each one owns the tables stored under
//! its account and reacts to actions addressed to it and to notifications
//! of actions it was made a recipient of.

pub mod addressbook;
pub mod hodl;

pub use addressbook::{AddressBook, AddressBookConfig, Person};
pub use hodl::{Balance, Hodl, HodlConfig, PARTY_MEMO};

use crate::domain::context::ActionContext;
use crate::domain::entities::Action;
use crate::errors::ContractError;
use shared_types::Name;

/// A contract deployed on one account.
pub trait Contract: Send + Sync {
    /// Account the contract is deployed on.
    fn account(&self) -> Name;

    /// Handle an action addressed to [`account`](Self::account).
    fn apply(&self, ctx: &mut ActionContext<'_>, action: &Action) -> Result<(), ContractError>;

    /// Handle a notification of `action`, executed by `action.account`.
    ///
    /// Ignored unless the contract overrides it.
    fn on_notify(
        &self,
        _ctx: &mut ActionContext<'_>,
        _action: &Action,
    ) -> Result<(), ContractError> {
        Ok(())
    }
}
