//! # Address Book
//!
//! One record per user, indexed by age.
//!
//! | Action | Authorization | Effects |
//! |--------|---------------|---------|
//! | `upsert` | `user` | create or patch the record, notify, count |
//! | `erase` | `user` | remove the record, notify, count |
//! | `notify` | the contract | forward the message to `user` |
//!
//! Every `upsert` / `erase` sends exactly one summary through the inline
//! `notify` action. A usage counter increment is queued whenever a row was
//! actually written.

use super::Contract;
use crate::domain::context::ActionContext;
use crate::domain::entities::{Action, UsageKind};
use crate::domain::table::{ChainDatabase, TableRow};
use crate::errors::ContractError;
use crate::events::{accounts, actions, ErasePayload, NotifyPayload, UpsertPayload};
use serde::{Deserialize, Serialize};
use shared_types::{Name, PermissionLevel};
use std::ops::RangeInclusive;
use tracing::debug;

/// Summary suffixes; the user's name is prepended.
pub const EMPLACED_MSG: &str = " successfully emplaced record to addressbook";
pub const MODIFIED_MSG: &str = " successfully modified record to addressbook";
pub const UNCHANGED_MSG: &str = " called upsert, but request resulted in no changes.";
pub const ERASED_MSG: &str = " successfully erased record from addressbook";

// =============================================================================
// ROW
// =============================================================================

/// An address book record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub key: Name,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub age: u64,
}

impl TableRow for Person {
    const TABLE: Name = Name::from_static("people");

    fn primary_key(&self) -> u64 {
        self.key.raw()
    }

    fn secondary_key(&self) -> Option<u64> {
        Some(self.age)
    }
}

impl From<UpsertPayload> for Person {
    fn from(p: UpsertPayload) -> Self {
        Self {
            key: p.user,
            first_name: p.first_name,
            last_name: p.last_name,
            street: p.street,
            city: p.city,
            state: p.state,
            age: p.age,
        }
    }
}

impl Person {
    /// Overwrite the fields that differ from `update` and return the names
    /// of the changed fields, each followed by a space, in declaration
    /// order of the upsert arguments. Empty if nothing changed.
    pub fn patch(&mut self, update: &UpsertPayload) -> String {
        fn set<T: PartialEq + Clone>(
            field: &mut T,
            value: &T,
            label: &str,
            changes: &mut String,
        ) {
            if field != value {
                *field = value.clone();
                changes.push_str(label);
                changes.push(' ');
            }
        }

        let mut changes = String::new();
        set(&mut self.first_name, &update.first_name, "first name", &mut changes);
        set(&mut self.last_name, &update.last_name, "last name", &mut changes);
        set(&mut self.age, &update.age, "age", &mut changes);
        set(&mut self.street, &update.street, "street", &mut changes);
        set(&mut self.city, &update.city, "city", &mut changes);
        set(&mut self.state, &update.state, "state", &mut changes);
        changes
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBookConfig {
    /// Account of the usage counter contract.
    pub counter_contract: Name,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            counter_contract: accounts::USAGE_COUNTER,
        }
    }
}

impl AddressBookConfig {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.counter_contract.is_empty() {
            return Err(ContractError::InvalidConfig(
                "counter_contract must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

pub struct AddressBook {
    account: Name,
    config: AddressBookConfig,
}

impl AddressBook {
    pub fn new(account: Name, config: AddressBookConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self { account, config })
    }

    #[must_use]
    pub fn config(&self) -> &AddressBookConfig {
        &self.config
    }

    fn upsert(&self, ctx: &mut ActionContext<'_>, p: UpsertPayload) -> Result<(), ContractError> {
        ctx.require_auth(p.user)?;
        let user = p.user;
        let scope = ctx.first_receiver();

        let existing = ctx.table::<Person>(scope).find(user.raw())?;
        match existing {
            None => {
                ctx.table_mut::<Person>(scope).emplace(user, &Person::from(p))?;
                self.send_summary(ctx, user, EMPLACED_MSG)?;
                self.increment_counter(ctx, user, UsageKind::Emplace)
            }
            Some(mut person) => {
                let changes = person.patch(&p);
                if changes.is_empty() {
                    return self.send_summary(ctx, user, UNCHANGED_MSG);
                }
                ctx.table_mut::<Person>(scope)
                    .modify(user.raw(), user, move |row| *row = person)?;
                debug!("[qc-11] {} changed {}", user, changes.trim_end());
                ctx.print(changes);
                self.send_summary(ctx, user, MODIFIED_MSG)?;
                self.increment_counter(ctx, user, UsageKind::Modify)
            }
        }
    }

    fn erase(&self, ctx: &mut ActionContext<'_>, p: ErasePayload) -> Result<(), ContractError> {
        ctx.require_auth(p.user)?;
        let scope = ctx.first_receiver();

        let mut people = ctx.table_mut::<Person>(scope);
        if !people.contains(p.user.raw()) {
            return Err(ContractError::NotFound("Record does not exist".into()));
        }
        people.erase(p.user.raw())?;

        self.send_summary(ctx, p.user, ERASED_MSG)?;
        self.increment_counter(ctx, p.user, UsageKind::Erase)
    }

    fn notify(&self, ctx: &mut ActionContext<'_>, p: NotifyPayload) -> Result<(), ContractError> {
        ctx.require_auth(ctx.receiver())?;
        ctx.require_recipient(p.user);
        Ok(())
    }

    fn send_summary(
        &self,
        ctx: &mut ActionContext<'_>,
        user: Name,
        suffix: &str,
    ) -> Result<(), ContractError> {
        let action = Action::new(
            self.account,
            actions::NOTIFY,
            vec![PermissionLevel::active(self.account)],
            &NotifyPayload {
                user,
                msg: format!("{user}{suffix}"),
            },
        )?;
        ctx.send_inline(action);
        Ok(())
    }

    fn increment_counter(
        &self,
        ctx: &mut ActionContext<'_>,
        user: Name,
        kind: UsageKind,
    ) -> Result<(), ContractError> {
        ctx.count_usage(self.config.counter_contract, user, kind)
    }

    // =========================================================================
    // READERS
    // =========================================================================

    /// Record of `user`, if any.
    pub fn record(&self, db: &ChainDatabase, user: Name) -> Result<Option<Person>, ContractError> {
        Ok(db.table::<Person>(self.account, self.account).find(user.raw())?)
    }

    /// All records, youngest first.
    pub fn records_by_age(&self, db: &ChainDatabase) -> Result<Vec<Person>, ContractError> {
        Ok(db.table::<Person>(self.account, self.account).by_secondary()?)
    }

    /// Records whose age lies in `ages`, youngest first.
    pub fn records_in_age_range(
        &self,
        db: &ChainDatabase,
        ages: RangeInclusive<u64>,
    ) -> Result<Vec<Person>, ContractError> {
        Ok(db
            .table::<Person>(self.account, self.account)
            .secondary_range(ages)?)
    }
}

impl Contract for AddressBook {
    fn account(&self) -> Name {
        self.account
    }

    fn apply(&self, ctx: &mut ActionContext<'_>, action: &Action) -> Result<(), ContractError> {
        match action.name {
            actions::UPSERT => self.upsert(ctx, action.decode()?),
            actions::ERASE => self.erase(ctx, action.decode()?),
            actions::NOTIFY => self.notify(ctx, action.decode()?),
            other => Err(ContractError::UnknownAction {
                contract: self.account,
                action: other,
            }),
        }
    }
}
