use async_trait::async_trait;

use crate::domain::{Connector, ConnectorStatus, DomainError};

/// Persistence contract for connectors.
///
/// The executor is the sole writer of success state; the scheduler only
/// reads and initiates triggers. Keeping the writers partitioned this way
/// is what lets the two loops share these rows without locks.
#[async_trait]
pub trait ConnectorRepository: Send + Sync {
    /// All enabled connectors, regardless of status.
    async fn get_active(&self) -> Result<Vec<Connector>, DomainError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Connector>, DomainError>;

    async fn save(&self, connector: &Connector) -> Result<(), DomainError>;

    async fn update_status(&self, id: i64, status: ConnectorStatus) -> Result<(), DomainError>;

    /// Set status to `Success` and stamp `last_successful_index_time`.
    async fn record_success(&self, id: i64, at: i64) -> Result<(), DomainError>;

    /// Set status to `Error` and record the message; the success
    /// timestamp is left untouched so the next due cycle retries.
    async fn record_error(&self, id: i64, message: &str) -> Result<(), DomainError>;
}
