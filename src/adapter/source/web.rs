use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::SourceConnector;
use crate::domain::{Connector, Document, DomainError, TriggerParams};

#[derive(Debug, Deserialize)]
struct WebConfig {
    url: String,
    #[serde(default)]
    extra_urls: Vec<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Fetches configured web pages, one document per URL.
///
/// Configuration keys: `url` (required), `extra_urls`, `timeout_secs`.
/// Unknown keys in the blob are ignored.
#[derive(Debug)]
pub struct WebConnector {
    connector_id: i64,
    urls: Vec<String>,
    client: reqwest::Client,
}

impl WebConnector {
    /// Pure config decoding; no I/O beyond building the HTTP client.
    pub fn configure(connector: &Connector) -> Result<Self, DomainError> {
        let blob = serde_json::to_value(connector.config())
            .map_err(|e| DomainError::config(e.to_string()))?;
        let config: WebConfig = serde_json::from_value(blob).map_err(|e| {
            DomainError::config(format!(
                "invalid web connector config for '{}': {}",
                connector.name(),
                e
            ))
        })?;

        if config.url.trim().is_empty() {
            return Err(DomainError::config("web connector requires a non-empty url"));
        }

        let mut urls = vec![config.url];
        urls.extend(config.extra_urls);

        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(30));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::config(e.to_string()))?;

        Ok(Self {
            connector_id: connector.id(),
            urls,
            client,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Document, DomainError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DomainError::execution(format!("fetch {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(DomainError::execution(format!(
                "fetch {} returned {}",
                url,
                response.status()
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| DomainError::execution(format!("read body of {} failed: {}", url, e)))?;

        debug!(url, "Fetched {} bytes", content.len());
        Ok(Document::new(self.connector_id, url.to_string(), content))
    }
}

#[async_trait]
impl SourceConnector for WebConnector {
    async fn execute(
        &self,
        cancel: &CancellationToken,
        _params: &TriggerParams,
    ) -> Result<Vec<Document>, DomainError> {
        let mut documents = Vec::new();
        let mut failures = Vec::new();

        for url in &self.urls {
            let document = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(DomainError::execution("connector execution canceled"));
                }
                result = self.fetch(url) => result,
            };

            match document {
                Ok(document) => documents.push(document),
                Err(e) => {
                    warn!(url, "Skipping URL: {}", e);
                    failures.push(e.to_string());
                }
            }
        }

        // Per-URL trouble is tolerated; a run with nothing fetched at all
        // is an execution failure.
        if documents.is_empty() && !failures.is_empty() {
            return Err(DomainError::execution(failures.join("; ")));
        }
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Source;
    use serde_json::json;
    use std::collections::HashMap;

    fn connector_with_config(config: HashMap<String, serde_json::Value>) -> Connector {
        Connector::new(1, "site".to_string(), Source::Web, config, 60, "t".to_string()).unwrap()
    }

    #[test]
    fn test_configure_requires_url() {
        let err = WebConnector::configure(&connector_with_config(HashMap::new())).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_configure_rejects_blank_url() {
        let config = HashMap::from([("url".to_string(), json!("  "))]);
        let err = WebConnector::configure(&connector_with_config(config)).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_configure_ignores_unknown_keys() {
        let config = HashMap::from([
            ("url".to_string(), json!("https://example.com")),
            ("left_over_setting".to_string(), json!(true)),
        ]);
        let web = WebConnector::configure(&connector_with_config(config)).unwrap();
        assert_eq!(web.urls, vec!["https://example.com".to_string()]);
    }

    #[test]
    fn test_configure_collects_extra_urls() {
        let config = HashMap::from([
            ("url".to_string(), json!("https://a.example")),
            ("extra_urls".to_string(), json!(["https://b.example"])),
        ]);
        let web = WebConnector::configure(&connector_with_config(config)).unwrap();
        assert_eq!(web.urls.len(), 2);
    }
}
