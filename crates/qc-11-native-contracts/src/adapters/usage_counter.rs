//! In-memory usage counter contract.
//!
//! Keeps one row per user with the number of emplace / modify / erase
//! operations the address book reported. Only the configured contract may
//! increment counters.

use crate::domain::entities::{UsageCall, UsageKind};
use crate::errors::GatewayError;
use crate::ports::outbound::UsageCounter;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Name;
use std::collections::HashMap;
use tracing::debug;

/// Counters of one user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageRecord {
    pub emplaced: u64,
    pub modified: u64,
    pub erased: u64,
}

impl UsageRecord {
    fn bump(&mut self, kind: UsageKind) {
        let slot = match kind {
            UsageKind::Emplace => &mut self.emplaced,
            UsageKind::Modify => &mut self.modified,
            UsageKind::Erase => &mut self.erased,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.emplaced + self.modified + self.erased
    }
}

pub struct InMemoryUsageCounter {
    authorized_caller: Name,
    records: RwLock<HashMap<Name, UsageRecord>>,
}

impl InMemoryUsageCounter {
    /// Counter that accepts increments from `authorized_caller` only.
    #[must_use]
    pub fn new(authorized_caller: Name) -> Self {
        Self {
            authorized_caller,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Counters of `user`; all zero if never counted.
    #[must_use]
    pub fn record(&self, user: Name) -> UsageRecord {
        self.records.read().get(&user).copied().unwrap_or_default()
    }
}

#[async_trait]
impl UsageCounter for InMemoryUsageCounter {
    async fn count(&self, call: &UsageCall) -> Result<(), GatewayError> {
        if call.caller != self.authorized_caller {
            return Err(GatewayError::Unauthorized {
                caller: call.caller,
            });
        }
        debug!("[qc-11] Count {} for {}", call.kind, call.user);
        self.records
            .write()
            .entry(call.user)
            .or_default()
            .bump(call.kind);
        Ok(())
    }
}
