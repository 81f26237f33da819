//! Outbound notifications emitted after a state change has committed.

use crate::domain::{MemberId, Money, SessionId, TableId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A table became available again for the floor display.
    #[serde(rename_all = "camelCase")]
    TableReleased {
        table_id: TableId,
        session_id: SessionId,
    },
    #[serde(rename_all = "camelCase")]
    MemberDebtChanged {
        member_id: MemberId,
        current_debt: Money,
    },
}

/// Sink for domain events.
///
/// Delivery is best-effort: a committed operation never fails because a
/// notification could not be delivered.
#[async_trait]
pub trait Notifier: Send + Sync + fmt::Debug {
    async fn notify(&self, event: DomainEvent);
}

/// Fans events out to in-process subscribers and logs each one.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, event: DomainEvent) {
        match &event {
            DomainEvent::TableReleased {
                table_id,
                session_id,
            } => info!(%table_id, %session_id, "table released"),
            DomainEvent::MemberDebtChanged {
                member_id,
                current_debt,
            } => info!(%member_id, %current_debt, "member debt changed"),
        }
        if self.sender.send(event).is_err() {
            debug!("no notification subscribers");
        }
    }
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe();

        let event = DomainEvent::TableReleased {
            table_id: TableId::new(3),
            session_id: SessionId::new(9),
        };
        notifier.notify(event.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers_is_fine() {
        let notifier = BroadcastNotifier::default();
        notifier
            .notify(DomainEvent::MemberDebtChanged {
                member_id: MemberId::new(1),
                current_debt: Money::ZERO,
            })
            .await;
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(DomainEvent::TableReleased {
            table_id: TableId::new(3),
            session_id: SessionId::new(9),
        })
        .unwrap();
        assert_eq!(json["type"], "tableReleased");
        assert_eq!(json["tableId"], 3);
    }
}
