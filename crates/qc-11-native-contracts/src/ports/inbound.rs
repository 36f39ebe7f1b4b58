//! # Driving Ports (API - Inbound)
//!
//! The interface callers use to run contract actions.

use crate::domain::entities::{Action, ActionReceipt};
use crate::errors::ContractError;
use crate::events::TransferPayload;
use async_trait::async_trait;

/// Primary API of the contract host.
///
/// ## Usage
///
/// ```ignore
/// let receipt = host.push_action(action).await?;
/// ```
#[async_trait]
pub trait ContractApi: Send + Sync {
    /// Execute `action` and every inline action it spawns as one unit of
    /// work.
    ///
    /// On error nothing is persisted and no queued effect is executed.
    async fn push_action(&self, action: Action) -> Result<ActionReceipt, ContractError>;

    /// Report a token transfer that happened outside the host. Hosted
    /// contracts among `from` / `to` receive it through `on_notify`.
    async fn notify_transfer(
        &self,
        transfer: TransferPayload,
    ) -> Result<ActionReceipt, ContractError>;
}
