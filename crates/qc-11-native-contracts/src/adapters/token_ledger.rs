//! In-memory token ledger standing in for the token contract.
//!
//! Balances are kept per `(account, symbol)`. A transfer either moves the
//! full quantity or fails without touching any balance.

use crate::domain::entities::TransferRequest;
use crate::errors::GatewayError;
use crate::ports::outbound::TransferGateway;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Asset, Name, Symbol};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Token balances plus a log of executed transfers.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    balances: RwLock<HashMap<(Name, Symbol), i64>>,
    history: RwLock<Vec<TransferRequest>>,
    fail_next: AtomicBool,
}

impl InMemoryTokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `quantity` to `account` out of thin air.
    pub fn issue(&self, account: Name, quantity: Asset) {
        *self
            .balances
            .write()
            .entry((account, quantity.symbol))
            .or_insert(0) += quantity.amount;
    }

    #[must_use]
    pub fn balance_of(&self, account: Name, symbol: Symbol) -> Asset {
        let amount = self
            .balances
            .read()
            .get(&(account, symbol))
            .copied()
            .unwrap_or(0);
        Asset { amount, symbol }
    }

    /// Transfers executed so far, oldest first.
    #[must_use]
    pub fn transfers(&self) -> Vec<TransferRequest> {
        self.history.read().clone()
    }

    /// Make the next transfer fail with `Unavailable`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransferGateway for InMemoryTokenLedger {
    async fn transfer(&self, request: &TransferRequest) -> Result<(), GatewayError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(format!(
                "{} rejected transfer",
                request.token_contract
            )));
        }

        let quantity = request.quantity;
        if quantity.amount <= 0 || !quantity.is_valid() {
            return Err(GatewayError::InvalidQuantity(quantity.to_string()));
        }

        let mut balances = self.balances.write();
        let available = balances
            .get(&(request.from, quantity.symbol))
            .copied()
            .unwrap_or(0);
        if available < quantity.amount {
            debug!("[qc-11] Transfer from {} overdrawn", request.from);
            return Err(GatewayError::InsufficientFunds {
                account: request.from,
                required: quantity.to_string(),
                available: Asset {
                    amount: available,
                    symbol: quantity.symbol,
                }
                .to_string(),
            });
        }

        *balances.entry((request.from, quantity.symbol)).or_insert(0) -= quantity.amount;
        *balances.entry((request.to, quantity.symbol)).or_insert(0) += quantity.amount;
        drop(balances);

        info!(
            "[qc-11] Transferred {} from {} to {}",
            quantity, request.from, request.to
        );
        self.history.write().push(request.clone());
        Ok(())
    }
}
