use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::{
    BusMessage, ConnectorRepository, MessageBus, MessageHandler, GROUP_ORCHESTRATOR,
    SUBJECT_EXECUTE_CONNECTOR, SUBJECT_UPDATE_CONNECTOR,
};
use crate::domain::{current_timestamp, Connector, DomainError, TriggerRequest};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub reload_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reload_interval: Duration::from_secs(30),
        }
    }
}

/// Staleness-driven trigger orchestrator.
///
/// On each reload tick it loads every enabled connector, computes which
/// ones are due, and publishes one trigger per due connector. A second
/// loop listens for connector-updated events and re-evaluates that one
/// connector immediately instead of waiting for the next tick.
pub struct ScheduleConnectorsUseCase {
    connector_repo: Arc<dyn ConnectorRepository>,
    bus: Arc<dyn MessageBus>,
    config: SchedulerConfig,
}

impl ScheduleConnectorsUseCase {
    pub fn new(
        connector_repo: Arc<dyn ConnectorRepository>,
        bus: Arc<dyn MessageBus>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            connector_repo,
            bus,
            config,
        }
    }

    /// Periodic reload loop; returns when `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            "Scheduler started, reload interval {:?}",
            self.config.reload_interval
        );
        let mut ticker = tokio::time::interval(self.config.reload_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Scheduler stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.reload_and_trigger().await;
                }
            }
        }
    }

    /// One reload cycle. Returns the number of triggers published.
    ///
    /// A publish failure for one connector never halts the batch; an
    /// offline bus skips the whole tick so a reconnect does not turn a
    /// half-evaluated cycle into a publish storm.
    pub async fn reload_and_trigger(&self) -> usize {
        if !self.bus.is_online() {
            warn!("Message bus offline, skipping reload cycle");
            return 0;
        }

        let connectors = match self.connector_repo.get_active().await {
            Ok(connectors) => connectors,
            Err(e) => {
                error!("Failed to load active connectors: {}", e);
                return 0;
            }
        };

        let now = current_timestamp();
        let mut published = 0usize;

        for connector in &connectors {
            if !connector.is_due(now) {
                continue;
            }
            match self.publish_trigger(connector).await {
                Ok(()) => {
                    debug!(
                        connector_id = connector.id(),
                        "Published trigger for due connector '{}'",
                        connector.name()
                    );
                    published += 1;
                }
                Err(e) => {
                    warn!(
                        connector_id = connector.id(),
                        "Failed to publish trigger: {}", e
                    );
                }
            }
        }

        if published > 0 {
            info!(
                "Reload cycle complete: {} of {} connectors triggered",
                published,
                connectors.len()
            );
        }
        published
    }

    /// Re-evaluate one connector, typically after its settings changed.
    /// Returns whether a trigger was published.
    pub async fn evaluate_connector(&self, connector_id: i64) -> Result<bool, DomainError> {
        let connector = self
            .connector_repo
            .find_by_id(connector_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("connector {}", connector_id)))?;

        if connector.is_disabled() || !connector.is_due(current_timestamp()) {
            return Ok(false);
        }

        self.publish_trigger(&connector).await?;
        debug!(connector_id, "Published trigger after update event");
        Ok(true)
    }

    /// Event-listener loop bound to the connector-updated subject.
    pub async fn listen_updates(
        self: Arc<Self>,
        cancel: CancellationToken,
    ) -> Result<(), DomainError> {
        let handler = Arc::new(UpdateEventHandler {
            scheduler: Arc::clone(&self),
        });
        self.bus
            .listen(cancel, SUBJECT_UPDATE_CONNECTOR, GROUP_ORCHESTRATOR, handler)
            .await
    }

    async fn publish_trigger(&self, connector: &Connector) -> Result<(), DomainError> {
        let trigger = TriggerRequest::new(connector.id());
        let payload =
            serde_json::to_vec(&trigger).map_err(|e| DomainError::internal(e.to_string()))?;
        self.bus.publish(SUBJECT_EXECUTE_CONNECTOR, &payload).await
    }
}

struct UpdateEventHandler {
    scheduler: Arc<ScheduleConnectorsUseCase>,
}

#[async_trait]
impl MessageHandler for UpdateEventHandler {
    async fn handle(&self, message: &BusMessage) -> Result<(), DomainError> {
        let event: TriggerRequest = match serde_json::from_slice(&message.payload) {
            Ok(event) => event,
            Err(e) => {
                // Malformed events are acked; redelivering junk helps nobody.
                warn!("Dropping malformed connector-updated event: {}", e);
                return Ok(());
            }
        };

        match self.scheduler.evaluate_connector(event.connector_id).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(
                    connector_id = event.connector_id,
                    "Update event for unknown connector, ignoring"
                );
                Ok(())
            }
            // Storage/transport trouble: leave unacked so the bus retries.
            Err(e) => Err(e),
        }
    }
}
