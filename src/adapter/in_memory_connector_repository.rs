use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::ConnectorRepository;
use crate::domain::{Connector, ConnectorStatus, DomainError};

pub struct InMemoryConnectorRepository {
    connectors: Mutex<HashMap<i64, Connector>>,
}

impl InMemoryConnectorRepository {
    pub fn new() -> Self {
        Self {
            connectors: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryConnectorRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectorRepository for InMemoryConnectorRepository {
    async fn get_active(&self) -> Result<Vec<Connector>, DomainError> {
        let connectors = self.connectors.lock().await;
        let mut active: Vec<Connector> = connectors
            .values()
            .filter(|c| !c.is_disabled())
            .cloned()
            .collect();
        active.sort_by_key(|c| c.id());
        Ok(active)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Connector>, DomainError> {
        let connectors = self.connectors.lock().await;
        Ok(connectors.get(&id).cloned())
    }

    async fn save(&self, connector: &Connector) -> Result<(), DomainError> {
        let mut connectors = self.connectors.lock().await;
        connectors.insert(connector.id(), connector.clone());
        debug!(connector_id = connector.id(), "Saved connector");
        Ok(())
    }

    async fn update_status(&self, id: i64, status: ConnectorStatus) -> Result<(), DomainError> {
        let mut connectors = self.connectors.lock().await;
        let connector = connectors
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("connector {}", id)))?;
        connector.set_status(status);
        Ok(())
    }

    async fn record_success(&self, id: i64, at: i64) -> Result<(), DomainError> {
        let mut connectors = self.connectors.lock().await;
        let connector = connectors
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("connector {}", id)))?;
        connector.record_success(at);
        Ok(())
    }

    async fn record_error(&self, id: i64, message: &str) -> Result<(), DomainError> {
        let mut connectors = self.connectors.lock().await;
        let connector = connectors
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("connector {}", id)))?;
        connector.record_error(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;
    use std::collections::HashMap as StdHashMap;

    fn connector(id: i64, disabled: bool) -> Connector {
        let mut c = Connector::new(
            id,
            format!("c{}", id),
            Source::Web,
            StdHashMap::new(),
            60,
            "t".to_string(),
        )
        .unwrap();
        if disabled {
            c.disable();
        }
        c
    }

    #[tokio::test]
    async fn test_get_active_excludes_disabled() {
        let repo = InMemoryConnectorRepository::new();
        repo.save(&connector(1, false)).await.unwrap();
        repo.save(&connector(2, true)).await.unwrap();

        let active = repo.get_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), 1);
    }

    #[tokio::test]
    async fn test_record_success_updates_row() {
        let repo = InMemoryConnectorRepository::new();
        repo.save(&connector(1, false)).await.unwrap();

        repo.record_success(1, 12345).await.unwrap();

        let stored = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.last_successful_index_time(), Some(12345));
        assert!(stored.status().is_success());
    }

    #[tokio::test]
    async fn test_update_missing_connector_is_not_found() {
        let repo = InMemoryConnectorRepository::new();
        let err = repo.record_error(99, "boom").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
