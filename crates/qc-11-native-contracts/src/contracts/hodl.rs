//! # Hodl Escrow
//!
//! Holders lock tokens by transferring them to the escrow account. Deposits
//! accumulate per holder until the deadline; afterwards each holder can
//! `party` to get the whole balance back.
//!
//! ## Lifecycle (per holder)
//!
//! ```text
//! [no row] --deposit--> [OPEN] --deposit--> [OPEN]
//!                          |
//!                  party (now > deadline)
//!                          v
//!                      [no row]
//! ```
//!
//! Deposits are not actions: they arrive as notifications of
//! `transfer` on the configured token contract.

use super::Contract;
use crate::domain::context::ActionContext;
use crate::domain::entities::Action;
use crate::domain::invariants::{
    invariant_balance_positive, invariant_deposit_quantity, invariant_deposit_window,
    invariant_release_window, is_incoming_transfer,
};
use crate::domain::table::{ChainDatabase, TableRow};
use crate::errors::ContractError;
use crate::events::{accounts, actions, PartyPayload, TransferPayload};
use serde::{Deserialize, Serialize};
use shared_types::{Asset, Name, Symbol, TimePointSec, MAX_PRECISION};
use tracing::{debug, info};

/// Memo of the release transfer.
pub const PARTY_MEMO: &str = "Party! Your hodl is free";

/// Printed when a transfer notification is not a deposit.
const NOT_A_DEPOSIT: &str = "These are not the droids you are looking for.";

/// June 9, 2018 01:00:00 UTC.
pub const DEFAULT_DEADLINE: TimePointSec = TimePointSec::from_secs(1_528_549_200);

// =============================================================================
// ROW
// =============================================================================

/// Escrowed funds of one holder in one denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub funds: Asset,
}

impl TableRow for Balance {
    const TABLE: Name = Name::from_static("balance");

    fn primary_key(&self) -> u64 {
        self.funds.symbol.code().raw()
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HodlConfig {
    /// Last instant deposits are refused at, first instant withdrawals are
    /// still refused at. Withdrawals open strictly after it.
    pub deadline: TimePointSec,
    /// The only denomination accepted.
    pub accepted_symbol: Symbol,
    /// Token contract whose transfer notifications count as deposits.
    pub token_contract: Name,
}

impl Default for HodlConfig {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            accepted_symbol: Symbol::from_static("SYS", 4),
            token_contract: accounts::TOKEN,
        }
    }
}

impl HodlConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.accepted_symbol.precision() > MAX_PRECISION {
            return Err(ContractError::InvalidConfig(format!(
                "precision {} exceeds {MAX_PRECISION}",
                self.accepted_symbol.precision()
            )));
        }
        if !self.accepted_symbol.code().is_valid() {
            return Err(ContractError::InvalidConfig(
                "accepted_symbol has an invalid code".into(),
            ));
        }
        if self.token_contract.is_empty() {
            return Err(ContractError::InvalidConfig(
                "token_contract must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

pub struct Hodl {
    account: Name,
    config: HodlConfig,
}

impl Hodl {
    pub fn new(account: Name, config: HodlConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self { account, config })
    }

    #[must_use]
    pub fn config(&self) -> &HodlConfig {
        &self.config
    }

    fn balance_key(&self) -> u64 {
        self.config.accepted_symbol.code().raw()
    }

    fn deposit(&self, ctx: &mut ActionContext<'_>, t: TransferPayload) -> Result<(), ContractError> {
        let receiver = ctx.receiver();
        if !is_incoming_transfer(receiver, t.from, t.to) {
            debug!(
                "[qc-11] {} ignoring transfer {} -> {}",
                receiver, t.from, t.to
            );
            ctx.print(NOT_A_DEPOSIT);
            return Ok(());
        }

        invariant_deposit_window(ctx.now(), self.config.deadline)?;
        invariant_deposit_quantity(&t.quantity, self.config.accepted_symbol)?;

        let key = self.balance_key();
        let mut balances = ctx.table_mut::<Balance>(t.from);
        let funds = match balances.find(key)? {
            Some(current) => {
                let funds = current.funds.checked_add(t.quantity)?;
                balances.modify(key, receiver, |row| row.funds = funds)?;
                funds
            }
            None => {
                balances.emplace(receiver, &Balance { funds: t.quantity })?;
                t.quantity
            }
        };
        debug_assert!(invariant_balance_positive(&funds));

        info!("[qc-11] {} holds {} for {}", receiver, funds, t.from);
        Ok(())
    }

    fn party(&self, ctx: &mut ActionContext<'_>, p: PartyPayload) -> Result<(), ContractError> {
        ctx.require_auth(p.hodler)?;
        invariant_release_window(ctx.now(), self.config.deadline)?;

        let key = self.balance_key();
        let balance = ctx
            .table::<Balance>(p.hodler)
            .find(key)?
            .ok_or(ContractError::NothingToClaim { holder: p.hodler })?;

        ctx.transfer(
            self.config.token_contract,
            p.hodler,
            balance.funds,
            PARTY_MEMO,
        )?;
        ctx.table_mut::<Balance>(p.hodler).erase(key)?;

        info!("[qc-11] Released {} to {}", balance.funds, p.hodler);
        Ok(())
    }

    // =========================================================================
    // READERS
    // =========================================================================

    /// Escrowed funds of `holder`, if any.
    pub fn balance_of(&self, db: &ChainDatabase, holder: Name) -> Result<Option<Asset>, ContractError> {
        Ok(db
            .table::<Balance>(self.account, holder)
            .find(self.balance_key())?
            .map(|row| row.funds))
    }
}

impl Contract for Hodl {
    fn account(&self) -> Name {
        self.account
    }

    fn apply(&self, ctx: &mut ActionContext<'_>, action: &Action) -> Result<(), ContractError> {
        match action.name {
            actions::PARTY => self.party(ctx, action.decode()?),
            other => Err(ContractError::UnknownAction {
                contract: self.account,
                action: other,
            }),
        }
    }

    fn on_notify(&self, ctx: &mut ActionContext<'_>, action: &Action) -> Result<(), ContractError> {
        if action.account != self.config.token_contract || action.name != actions::TRANSFER {
            return Ok(());
        }
        self.deposit(ctx, action.decode()?)
    }
}
