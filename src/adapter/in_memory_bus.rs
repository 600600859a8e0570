use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::{BusMessage, MessageBus, MessageHandler};
use crate::domain::DomainError;

#[derive(Default)]
struct SubjectState {
    /// Retained stream; consumer groups hold cursors into it, so a group
    /// created after a publish still receives the older messages.
    messages: Vec<BusMessage>,
    groups: HashMap<String, GroupCursor>,
}

#[derive(Default)]
struct GroupCursor {
    next: usize,
    /// Delivery attempts for the message currently at `next`.
    attempts: u32,
}

/// In-process message bus with per-subject retained streams and
/// at-least-once delivery per consumer group.
///
/// An unacknowledged message (handler error) is redelivered after a short
/// delay, up to `max_deliveries` attempts; after that it is dead-lettered
/// so one poisoned message cannot wedge the group. `set_online(false)`
/// makes publishes fail and the health probe report offline, which is how
/// tests exercise the scheduler's skip-cycle behavior.
pub struct InMemoryMessageBus {
    state: Mutex<HashMap<String, SubjectState>>,
    notify: Notify,
    online: AtomicBool,
    max_deliveries: u32,
    retry_delay: Duration,
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            online: AtomicBool::new(true),
            max_deliveries: 3,
            retry_delay: Duration::from_millis(25),
        }
    }

    pub fn with_retry(max_deliveries: u32, retry_delay: Duration) -> Self {
        Self {
            max_deliveries: max_deliveries.max(1),
            retry_delay,
            ..Self::new()
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        if online {
            self.notify.notify_waiters();
        }
    }

    /// Number of messages retained on a subject (test observability).
    pub async fn stream_len(&self, subject: &str) -> usize {
        let state = self.state.lock().await;
        state.get(subject).map(|s| s.messages.len()).unwrap_or(0)
    }

    async fn take_next(&self, subject: &str, group: &str) -> Option<BusMessage> {
        let mut state = self.state.lock().await;
        let subject_state = state.entry(subject.to_string()).or_default();
        let cursor = subject_state.groups.entry(group.to_string()).or_default();

        let message = subject_state.messages.get(cursor.next)?;
        let mut delivery = message.clone();
        delivery.delivery_attempt = cursor.attempts + 1;
        Some(delivery)
    }

    async fn ack(&self, subject: &str, group: &str) {
        let mut state = self.state.lock().await;
        if let Some(cursor) = state
            .get_mut(subject)
            .and_then(|s| s.groups.get_mut(group))
        {
            cursor.next += 1;
            cursor.attempts = 0;
        }
    }

    /// Record a failed delivery; returns true when the message has been
    /// dead-lettered and the cursor advanced.
    async fn nack(&self, subject: &str, group: &str, correlation_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let cursor = match state.get_mut(subject).and_then(|s| s.groups.get_mut(group)) {
            Some(cursor) => cursor,
            None => return false,
        };
        cursor.attempts += 1;
        if cursor.attempts >= self.max_deliveries {
            warn!(
                subject,
                group, correlation_id, "Message exhausted {} deliveries, dead-lettering", cursor.attempts
            );
            cursor.next += 1;
            cursor.attempts = 0;
            return true;
        }
        false
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), DomainError> {
        if !self.is_online() {
            return Err(DomainError::transport("message bus is offline"));
        }

        let message = BusMessage::new(payload.to_vec());
        debug!(
            subject,
            correlation_id = %message.correlation_id,
            "Publishing message ({} bytes)",
            payload.len()
        );

        let mut state = self.state.lock().await;
        state
            .entry(subject.to_string())
            .or_default()
            .messages
            .push(message);
        drop(state);

        self.notify.notify_waiters();
        Ok(())
    }

    async fn listen(
        &self,
        cancel: CancellationToken,
        subject: &str,
        group: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), DomainError> {
        debug!(subject, group, "Consumer loop started");

        loop {
            // Register for wakeups before checking state, otherwise a
            // publish between the check and the await is lost.
            let notified = self.notify.notified();

            match self.take_next(subject, group).await {
                Some(message) => match handler.handle(&message).await {
                    Ok(()) => {
                        self.ack(subject, group).await;
                    }
                    Err(e) => {
                        let dead = self.nack(subject, group, &message.correlation_id).await;
                        if !dead {
                            debug!(
                                subject,
                                group,
                                attempt = message.delivery_attempt,
                                "Handler failed, will redeliver: {}",
                                e
                            );
                            tokio::select! {
                                _ = cancel.cancelled() => return Ok(()),
                                _ = tokio::time::sleep(self.retry_delay) => {}
                            }
                        }
                    }
                },
                None => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(subject, group, "Consumer loop stopping");
                            return Ok(());
                        }
                        _ = notified => {}
                    }
                }
            }

            if cancel.is_cancelled() {
                debug!(subject, group, "Consumer loop stopping");
                return Ok(());
            }
        }
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        seen: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl MessageHandler for CountingHandler {
        async fn handle(&self, _message: &BusMessage) -> Result<(), DomainError> {
            let n = self.seen.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                Err(DomainError::execution("induced failure"))
            } else {
                Ok(())
            }
        }
    }

    async fn run_listener(
        bus: Arc<InMemoryMessageBus>,
        handler: Arc<CountingHandler>,
    ) -> CancellationToken {
        let cancel = CancellationToken::new();
        let listener_cancel = cancel.clone();
        tokio::spawn(async move {
            bus.listen(listener_cancel, "subj", "grp", handler)
                .await
                .unwrap();
        });
        cancel
    }

    #[tokio::test]
    async fn test_publish_before_listen_is_delivered() {
        let bus = Arc::new(InMemoryMessageBus::new());
        bus.publish("subj", b"one").await.unwrap();

        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_first: 0,
        });
        let cancel = run_listener(Arc::clone(&bus), Arc::clone(&handler)).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        assert_eq!(handler.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_handler_gets_redelivery() {
        let bus = Arc::new(InMemoryMessageBus::with_retry(3, Duration::from_millis(5)));
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_first: 1,
        });
        let cancel = run_listener(Arc::clone(&bus), Arc::clone(&handler)).await;

        bus.publish("subj", b"retry-me").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        // First delivery fails, redelivery succeeds.
        assert_eq!(handler.seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_poisoned_message_is_dead_lettered() {
        let bus = Arc::new(InMemoryMessageBus::with_retry(2, Duration::from_millis(5)));
        let handler = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_first: 2,
        });
        let cancel = run_listener(Arc::clone(&bus), Arc::clone(&handler)).await;

        bus.publish("subj", b"poison").await.unwrap();
        bus.publish("subj", b"good").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        // Two failing attempts for the poisoned message, then the good one.
        assert_eq!(handler.seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_offline_bus_rejects_publish() {
        let bus = InMemoryMessageBus::new();
        bus.set_online(false);
        assert!(!bus.is_online());

        let err = bus.publish("subj", b"nope").await.unwrap_err();
        assert!(err.is_transport_error());
    }

    #[tokio::test]
    async fn test_groups_consume_independently() {
        let bus = Arc::new(InMemoryMessageBus::new());
        bus.publish("subj", b"shared").await.unwrap();

        let a = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_first: 0,
        });
        let b = Arc::new(CountingHandler {
            seen: AtomicUsize::new(0),
            fail_first: 0,
        });

        let cancel = CancellationToken::new();
        for (group, handler) in [("grp-a", Arc::clone(&a)), ("grp-b", Arc::clone(&b))] {
            let bus = Arc::clone(&bus);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                bus.listen(cancel, "subj", group, handler).await.unwrap();
            });
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();

        assert_eq!(a.seen.load(Ordering::SeqCst), 1);
        assert_eq!(b.seen.load(Ordering::SeqCst), 1);
    }
}
