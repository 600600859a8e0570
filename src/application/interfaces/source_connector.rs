use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Document, DomainError, TriggerParams};

/// A built, configured source plugin ready to fetch content.
///
/// Construction (config decoding) happens per source variant in the
/// registry and performs no I/O; `execute` does the actual fetch, may be
/// long-running, and must honor cancellation.
#[async_trait]
pub trait SourceConnector: Send + Sync + std::fmt::Debug {
    async fn execute(
        &self,
        cancel: &CancellationToken,
        params: &TriggerParams,
    ) -> Result<Vec<Document>, DomainError>;
}
