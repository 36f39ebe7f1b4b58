//! In-memory notification inbox.

use crate::domain::entities::Notification;
use crate::ports::outbound::NotificationChannel;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Name;
use std::collections::HashMap;
use tracing::debug;

/// Keeps every delivered notification, grouped by recipient.
#[derive(Debug, Default)]
pub struct InMemoryNotificationChannel {
    inboxes: RwLock<HashMap<Name, Vec<Notification>>>,
}

impl InMemoryNotificationChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received by `recipient`, oldest first.
    #[must_use]
    pub fn inbox(&self, recipient: Name) -> Vec<Notification> {
        self.inboxes
            .read()
            .get(&recipient)
            .cloned()
            .unwrap_or_default()
    }

    /// Total notifications delivered.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.inboxes.read().values().map(Vec::len).sum()
    }

    pub fn clear(&self) {
        self.inboxes.write().clear();
    }
}

#[async_trait]
impl NotificationChannel for InMemoryNotificationChannel {
    async fn deliver(&self, notification: Notification) {
        debug!(
            "[qc-11] Notify {} of {}::{}",
            notification.recipient, notification.contract, notification.action
        );
        self.inboxes
            .write()
            .entry(notification.recipient)
            .or_default()
            .push(notification);
    }
}
