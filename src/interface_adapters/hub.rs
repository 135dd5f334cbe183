// Per-connection outbound queues; the transport side of the `Notifier` port.

use crate::domain::PlayerId;
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::{Notifier, ServerEvent};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

const FULL_QUEUE_LOG_THROTTLE: Duration = Duration::from_secs(2);

pub struct ConnectionHub {
    capacity: usize,
    outbound: RwLock<HashMap<PlayerId, mpsc::Sender<Utf8Bytes>>>,
    last_full_log: Mutex<Option<Instant>>,
}

impl ConnectionHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            outbound: RwLock::new(HashMap::new()),
            last_full_log: Mutex::new(None),
        }
    }

    /// Opens the outbound queue for a connection.
    pub fn register(&self, player_id: PlayerId) -> mpsc::Receiver<Utf8Bytes> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.outbound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player_id, tx);
        rx
    }

    pub fn unregister(&self, player_id: PlayerId) {
        self.outbound
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&player_id);
    }

    pub fn connection_count(&self) -> usize {
        self.outbound
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn should_log_full(&self) -> bool {
        let mut last = self
            .last_full_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) if at.elapsed() < FULL_QUEUE_LOG_THROTTLE => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

impl Notifier for ConnectionHub {
    fn notify(&self, recipients: &[PlayerId], event: &ServerEvent) {
        if recipients.is_empty() {
            return;
        }
        // Serialize once and share the bytes across recipients.
        let txt = match serde_json::to_string(&ServerMessage::from(event)) {
            Ok(txt) => txt,
            Err(e) => {
                error!(error = ?e, "failed to serialize server event");
                return;
            }
        };
        let bytes = Utf8Bytes::from(txt);

        let outbound = self.outbound.read().unwrap_or_else(PoisonError::into_inner);
        for player_id in recipients {
            let Some(tx) = outbound.get(player_id) else {
                continue;
            };
            match tx.try_send(bytes.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    if self.should_log_full() {
                        warn!(player_id, "outbound queue full; dropping message");
                    }
                }
                // The connection task is shutting down.
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn when_event_is_sent_then_only_registered_recipients_receive_it() {
        let hub = ConnectionHub::new(4);
        let mut first = hub.register(1);
        let mut second = hub.register(2);

        hub.notify(
            &[1, 3],
            &ServerEvent::ReadyChanged {
                player_id: 1,
                ready: true,
            },
        );

        let bytes = first.recv().await.expect("queued message");
        let value: serde_json::Value = serde_json::from_str(bytes.as_str()).expect("json");
        assert_eq!(value["type"], "ready_changed");
        assert_eq!(value["data"]["player_id"], "1");
        assert!(second.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_queue_is_full_then_messages_are_dropped_without_blocking() {
        let hub = ConnectionHub::new(1);
        let mut rx = hub.register(1);
        let event = ServerEvent::RoomFull {
            room_id: "r1".to_string(),
        };

        hub.notify(&[1], &event);
        hub.notify(&[1], &event);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unregistered_connections_are_forgotten() {
        let hub = ConnectionHub::new(4);
        let _rx = hub.register(9);
        assert_eq!(hub.connection_count(), 1);
        hub.unregister(9);
        assert_eq!(hub.connection_count(), 0);
    }
}
