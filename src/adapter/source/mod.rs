mod web;

pub use web::WebConnector;

use tracing::debug;

use crate::application::{ConnectorFactory, SourceConnector};
use crate::domain::{Connector, DomainError, Source};

/// Closed dispatch from a connector's source tag to a built plugin.
///
/// Adding a source type means adding a `Source` variant and an arm here;
/// call sites stay untouched.
pub struct ConnectorRegistry;

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorFactory for ConnectorRegistry {
    fn build(&self, connector: &Connector) -> Result<Box<dyn SourceConnector>, DomainError> {
        debug!(
            connector_id = connector.id(),
            source = connector.source().as_str(),
            "Building source connector"
        );
        match connector.source() {
            Source::Web => Ok(Box::new(WebConnector::configure(connector)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_registry_builds_web_connector() {
        let config = HashMap::from([("url".to_string(), json!("https://example.com"))]);
        let connector =
            Connector::new(1, "site".to_string(), Source::Web, config, 60, "t".to_string())
                .unwrap();

        assert!(ConnectorRegistry::new().build(&connector).is_ok());
    }

    #[test]
    fn test_registry_surfaces_config_errors() {
        let connector = Connector::new(
            1,
            "broken".to_string(),
            Source::Web,
            HashMap::new(),
            60,
            "t".to_string(),
        )
        .unwrap();

        let err = ConnectorRegistry::new().build(&connector).unwrap_err();
        assert!(err.is_config_error());
    }
}
