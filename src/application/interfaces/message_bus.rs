use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::DomainError;

/// Subject carrying connector-updated events; the scheduler listens here
/// to re-evaluate a single connector out of band.
pub const SUBJECT_UPDATE_CONNECTOR: &str = "update-connector";
pub const GROUP_ORCHESTRATOR: &str = "orchestrator-subscription";

/// Subject carrying trigger requests for the executor.
pub const SUBJECT_EXECUTE_CONNECTOR: &str = "execute-connector";
pub const GROUP_EXECUTOR: &str = "executor";

/// One delivered message, with correlation metadata propagated across
/// redeliveries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub correlation_id: String,
    pub payload: Vec<u8>,
    /// 1 on first delivery, incremented on each redelivery.
    pub delivery_attempt: u32,
}

impl BusMessage {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            payload,
            delivery_attempt: 1,
        }
    }
}

/// Callback invoked once per delivered message.
///
/// Returning `Err` leaves the message unacknowledged; the transport
/// redelivers it up to its retry bound. Returning `Ok` acknowledges.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &BusMessage) -> Result<(), DomainError>;
}

/// Durable publish/subscribe transport with named subjects and
/// at-least-once delivery per consumer group.
///
/// Consumers must be idempotent: the worst case of a duplicate delivery
/// is a redundant, harmless re-execution keyed by entity identity.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Deliver `payload` to the persistent stream behind `subject`.
    async fn publish(&self, subject: &str, payload: &[u8]) -> Result<(), DomainError>;

    /// Invoke `handler` for each message delivered to `group` on
    /// `subject`. Blocks until `cancel` fires or the transport fails
    /// unrecoverably.
    async fn listen(
        &self,
        cancel: CancellationToken,
        subject: &str,
        group: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), DomainError>;

    /// Non-blocking health probe; the scheduler skips a reload cycle
    /// entirely when this reports false.
    fn is_online(&self) -> bool;
}
