use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::use_cases::EmbedDocumentsUseCase;
use crate::application::{
    BusMessage, ConnectorFactory, ConnectorRepository, DocumentRepository, MessageBus,
    MessageHandler, SourceConnector, GROUP_EXECUTOR, SUBJECT_EXECUTE_CONNECTOR,
};
use crate::domain::{current_timestamp, ConnectorStatus, DomainError, TriggerRequest};

/// Consumer loop bound to the execution subject.
///
/// For each trigger the connector is re-loaded from storage by identity;
/// nothing else on the wire is trusted, which keeps stale and duplicate
/// deliveries harmless. One connector's failure is recorded on that
/// connector and never terminates the loop.
pub struct ExecuteConnectorUseCase {
    connector_repo: Arc<dyn ConnectorRepository>,
    document_repo: Arc<dyn DocumentRepository>,
    factory: Arc<dyn ConnectorFactory>,
    embed_pipeline: Arc<EmbedDocumentsUseCase>,
    bus: Arc<dyn MessageBus>,
    collection: String,
    cancel: CancellationToken,
}

impl ExecuteConnectorUseCase {
    pub fn new(
        connector_repo: Arc<dyn ConnectorRepository>,
        document_repo: Arc<dyn DocumentRepository>,
        factory: Arc<dyn ConnectorFactory>,
        embed_pipeline: Arc<EmbedDocumentsUseCase>,
        bus: Arc<dyn MessageBus>,
        collection: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector_repo,
            document_repo,
            factory,
            embed_pipeline,
            bus,
            collection,
            cancel,
        }
    }

    /// Blocks consuming triggers until the cancel token fires.
    pub async fn run(self: Arc<Self>) -> Result<(), DomainError> {
        info!("Executor started on '{}'", SUBJECT_EXECUTE_CONNECTOR);
        let cancel = self.cancel.clone();
        let bus = Arc::clone(&self.bus);
        bus.listen(cancel, SUBJECT_EXECUTE_CONNECTOR, GROUP_EXECUTOR, self)
            .await
    }

    /// Handle one trigger end to end. Returns `Err` only for transient
    /// storage trouble, where redelivery is the right retry.
    pub async fn execute_trigger(&self, trigger: &TriggerRequest) -> Result<(), DomainError> {
        let connector = match self.connector_repo.find_by_id(trigger.connector_id).await? {
            Some(connector) => connector,
            None => {
                warn!(
                    connector_id = trigger.connector_id,
                    "Trigger for unknown connector, dropping"
                );
                return Ok(());
            }
        };

        if connector.is_disabled() {
            debug!(connector_id = connector.id(), "Connector disabled, skipping");
            return Ok(());
        }

        let plugin = match self.factory.build(&connector) {
            Ok(plugin) => plugin,
            Err(e) => {
                // Config errors are fatal to this build and never retried
                // automatically; the operator has to fix the connector.
                warn!(connector_id = connector.id(), "Connector build failed: {}", e);
                self.connector_repo
                    .record_error(connector.id(), &e.to_string())
                    .await?;
                return Ok(());
            }
        };

        self.connector_repo
            .update_status(connector.id(), ConnectorStatus::InProgress)
            .await?;

        let documents = match plugin.execute(&self.cancel, &trigger.params).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(
                    connector_id = connector.id(),
                    "Connector execution failed: {}", e
                );
                // The success timestamp stays untouched, so the next due
                // cycle retries. Ack: redelivery would just repeat the
                // same failing fetch immediately.
                self.connector_repo
                    .record_error(connector.id(), &e.to_string())
                    .await?;
                return Ok(());
            }
        };

        info!(
            connector_id = connector.id(),
            "Fetched {} documents from '{}'",
            documents.len(),
            connector.name()
        );
        self.document_repo.save(&documents).await?;

        match self
            .embed_pipeline
            .execute(&self.collection, &documents)
            .await
        {
            Ok(report) if report.is_partial() => {
                warn!(
                    connector_id = connector.id(),
                    "Embedding partial: {} failed chunks",
                    report.failed().len()
                );
            }
            Ok(_) => {}
            Err(e) => {
                self.connector_repo
                    .record_error(connector.id(), &e.to_string())
                    .await?;
                return Ok(());
            }
        }

        self.connector_repo
            .record_success(connector.id(), current_timestamp())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for ExecuteConnectorUseCase {
    async fn handle(&self, message: &BusMessage) -> Result<(), DomainError> {
        let trigger: TriggerRequest = match serde_json::from_slice(&message.payload) {
            Ok(trigger) => trigger,
            Err(e) => {
                warn!("Dropping malformed trigger: {}", e);
                return Ok(());
            }
        };

        debug!(
            connector_id = trigger.connector_id,
            correlation_id = %message.correlation_id,
            attempt = message.delivery_attempt,
            "Executing trigger"
        );
        self.execute_trigger(&trigger).await
    }
}
