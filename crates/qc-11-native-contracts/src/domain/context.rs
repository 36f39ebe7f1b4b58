//! # Action Context
//!
//! What a contract sees while one of its actions (or notifications) runs.
//!
//! Table access is restricted to tables owned by the receiving contract.
//! Side effects are not performed here; they are queued in the [`Outbox`]
//! and executed by the host once the whole unit of work has succeeded.

use super::entities::{Action, UsageKind};
use super::table::{ChainDatabase, MultiIndex, TableRow, TableView};
use crate::errors::ContractError;
use crate::events::{actions, CountPayload, TransferPayload};
use crate::ports::outbound::AuthorizationGate;
use shared_types::{Asset, Name, PermissionLevel, TimePointSec};

// =============================================================================
// OUTBOX
// =============================================================================

/// Effects queued by one contract invocation.
#[derive(Debug, Default)]
pub struct Outbox {
    inline_actions: Vec<Action>,
    recipients: Vec<Name>,
    console: Vec<String>,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inline actions in the order they were sent.
    #[must_use]
    pub fn inline_actions(&self) -> &[Action] {
        &self.inline_actions
    }

    /// Accounts to be notified of the running action, without duplicates.
    #[must_use]
    pub fn recipients(&self) -> &[Name] {
        &self.recipients
    }

    #[must_use]
    pub fn console(&self) -> &[String] {
        &self.console
    }

    /// Split into `(inline actions, recipients, console lines)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Action>, Vec<Name>, Vec<String>) {
        (self.inline_actions, self.recipients, self.console)
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Execution context handed to [`Contract::apply`](crate::contracts::Contract::apply)
/// and [`Contract::on_notify`](crate::contracts::Contract::on_notify).
pub struct ActionContext<'a> {
    receiver: Name,
    action: &'a Action,
    now: TimePointSec,
    db: &'a mut ChainDatabase,
    auth: &'a dyn AuthorizationGate,
    outbox: &'a mut Outbox,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        receiver: Name,
        action: &'a Action,
        now: TimePointSec,
        db: &'a mut ChainDatabase,
        auth: &'a dyn AuthorizationGate,
        outbox: &'a mut Outbox,
    ) -> Self {
        Self {
            receiver,
            action,
            now,
            db,
            auth,
            outbox,
        }
    }

    /// Contract currently executing.
    #[must_use]
    pub fn receiver(&self) -> Name {
        self.receiver
    }

    /// Account the action was originally addressed to.
    #[must_use]
    pub fn first_receiver(&self) -> Name {
        self.action.account
    }

    #[must_use]
    pub fn action(&self) -> &'a Action {
        self.action
    }

    #[must_use]
    pub fn now(&self) -> TimePointSec {
        self.now
    }

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================

    #[must_use]
    pub fn has_auth(&self, account: Name) -> bool {
        self.auth.has_auth(account)
    }

    pub fn require_auth(&self, account: Name) -> Result<(), ContractError> {
        self.auth.require_auth(account)
    }

    // =========================================================================
    // TABLES
    // =========================================================================

    /// Read-only view of one of the receiver's tables.
    #[must_use]
    pub fn table<T: TableRow>(&self, scope: Name) -> TableView<'_, T> {
        self.db.table::<T>(self.receiver, scope)
    }

    /// Mutable view of one of the receiver's tables.
    pub fn table_mut<T: TableRow>(&mut self, scope: Name) -> MultiIndex<'_, T> {
        self.db.table_mut::<T>(self.receiver, scope)
    }

    // =========================================================================
    // EFFECTS
    // =========================================================================

    /// Have `account` notified of the running action. The receiver itself
    /// and repeated requests are ignored.
    pub fn require_recipient(&mut self, account: Name) {
        if account != self.receiver && !self.outbox.recipients.contains(&account) {
            self.outbox.recipients.push(account);
        }
    }

    /// Queue an inline action. It runs after the current one, inside the
    /// same unit of work.
    pub fn send_inline(&mut self, action: Action) {
        self.outbox.inline_actions.push(action);
    }

    /// Queue a `transfer` from the receiver through `token_contract`.
    pub fn transfer(
        &mut self,
        token_contract: Name,
        to: Name,
        quantity: Asset,
        memo: impl Into<String>,
    ) -> Result<(), ContractError> {
        let payload = TransferPayload {
            from: self.receiver,
            to,
            quantity,
            memo: memo.into(),
        };
        let action = Action::new(
            token_contract,
            actions::TRANSFER,
            vec![PermissionLevel::active(self.receiver)],
            &payload,
        )?;
        self.send_inline(action);
        Ok(())
    }

    /// Queue a usage counter increment on `counter` for `user`.
    pub fn count_usage(
        &mut self,
        counter: Name,
        user: Name,
        kind: UsageKind,
    ) -> Result<(), ContractError> {
        let action = Action::new(
            counter,
            actions::COUNT,
            vec![PermissionLevel::active(self.receiver)],
            &CountPayload { user, kind },
        )?;
        self.send_inline(action);
        Ok(())
    }

    /// Append a line to the receipt console.
    pub fn print(&mut self, line: impl Into<String>) {
        self.outbox.console.push(line.into());
    }
}
