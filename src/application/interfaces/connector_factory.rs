use crate::application::SourceConnector;
use crate::domain::{Connector, DomainError};

/// Builds a configured source plugin from a connector record.
///
/// Dispatches on the connector's source tag; a malformed or incomplete
/// config blob fails fast with a `ConfigError` before any I/O happens.
pub trait ConnectorFactory: Send + Sync {
    fn build(&self, connector: &Connector) -> Result<Box<dyn SourceConnector>, DomainError>;
}
