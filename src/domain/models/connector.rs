use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::DomainError;

/// The external system a connector ingests content from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    Web,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Web => "web",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "web" | "website" => Source::Web,
            unknown => {
                warn!("Unknown source type '{}', defaulting to web", unknown);
                Source::Web
            }
        }
    }
}

/// Indexing lifecycle state of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    Created,
    Active,
    Error,
    Success,
    InProgress,
}

impl ConnectorStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, ConnectorStatus::InProgress)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ConnectorStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConnectorStatus::Success)
    }
}

/// A configured source of external content to ingest.
///
/// The connector's source-specific settings live in an opaque string-keyed
/// blob; each source variant decodes and validates the keys it needs at
/// build time. `status` and `last_successful_index_time` are the only
/// fields shared between the scheduler (trigger initiation) and the
/// executor (success/error recording).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    id: i64,
    name: String,
    source: Source,
    config: HashMap<String, Value>,
    refresh_frequency_secs: u64,
    last_successful_index_time: Option<i64>,
    status: ConnectorStatus,
    disabled: bool,
    tenant_id: String,
    last_error: Option<String>,
    created_at: i64,
}

impl Connector {
    pub fn new(
        id: i64,
        name: String,
        source: Source,
        config: HashMap<String, Value>,
        refresh_frequency_secs: u64,
        tenant_id: String,
    ) -> Result<Self, DomainError> {
        if refresh_frequency_secs == 0 {
            return Err(DomainError::invalid_input(
                "refresh_frequency_secs must be greater than zero",
            ));
        }
        Ok(Self {
            id,
            name,
            source,
            config,
            refresh_frequency_secs,
            last_successful_index_time: None,
            status: ConnectorStatus::Created,
            disabled: false,
            tenant_id,
            last_error: None,
            created_at: current_timestamp(),
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Source {
        self.source
    }

    pub fn config(&self) -> &HashMap<String, Value> {
        &self.config
    }

    pub fn refresh_frequency_secs(&self) -> u64 {
        self.refresh_frequency_secs
    }

    pub fn last_successful_index_time(&self) -> Option<i64> {
        self.last_successful_index_time
    }

    pub fn status(&self) -> ConnectorStatus {
        self.status
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// A connector that has never indexed successfully is always due;
    /// otherwise it is due once its staleness reaches the refresh interval.
    pub fn is_due(&self, now: i64) -> bool {
        match self.last_successful_index_time {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.refresh_frequency_secs as i64,
        }
    }

    pub fn set_status(&mut self, status: ConnectorStatus) {
        self.status = status;
    }

    pub fn record_success(&mut self, at: i64) {
        self.status = ConnectorStatus::Success;
        self.last_successful_index_time = Some(at);
        self.last_error = None;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.status = ConnectorStatus::Error;
        self.last_error = Some(message.into());
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }
}

pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(refresh: u64) -> Connector {
        Connector::new(
            1,
            "docs".to_string(),
            Source::Web,
            HashMap::new(),
            refresh,
            "tenant-1".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_refresh_frequency_rejected() {
        let result = Connector::new(
            1,
            "docs".to_string(),
            Source::Web,
            HashMap::new(),
            0,
            "tenant-1".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_never_indexed_is_due() {
        let c = connector(3600);
        assert!(c.is_due(current_timestamp()));
    }

    #[test]
    fn test_fresh_connector_is_not_due() {
        let mut c = connector(3600);
        let now = current_timestamp();
        c.record_success(now - 60);
        assert!(!c.is_due(now));
    }

    #[test]
    fn test_stale_connector_is_due() {
        let mut c = connector(60);
        let now = current_timestamp();
        c.record_success(now - 120);
        assert!(c.is_due(now));
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let mut c = connector(60);
        let now = current_timestamp();
        c.record_success(now - 60);
        assert!(c.is_due(now));
    }

    #[test]
    fn test_record_error_keeps_timestamp() {
        let mut c = connector(60);
        let now = current_timestamp();
        c.record_success(now - 120);
        c.record_error("fetch failed");
        assert_eq!(c.last_successful_index_time(), Some(now - 120));
        assert_eq!(c.status(), ConnectorStatus::Error);
        assert_eq!(c.last_error(), Some("fetch failed"));
    }

    #[test]
    fn test_record_success_clears_error() {
        let mut c = connector(60);
        c.record_error("boom");
        c.record_success(current_timestamp());
        assert!(c.last_error().is_none());
        assert!(c.status().is_success());
    }
}
