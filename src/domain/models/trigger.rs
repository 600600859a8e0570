use serde::{Deserialize, Serialize};

/// Optional run parameters carried alongside a trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Ignore incremental state and re-fetch everything.
    #[serde(default)]
    pub force_full: bool,
}

/// A request to execute one connector's ingestion now.
///
/// Ephemeral wire type: it exists only on the message bus. Consumers must
/// trust nothing beyond the identity and re-derive connector state from
/// storage, which keeps duplicate delivery harmless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub connector_id: i64,
    #[serde(default)]
    pub params: TriggerParams,
}

impl TriggerRequest {
    pub fn new(connector_id: i64) -> Self {
        Self {
            connector_id,
            params: TriggerParams::default(),
        }
    }

    pub fn with_params(connector_id: i64, params: TriggerParams) -> Self {
        Self {
            connector_id,
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_round_trips_on_the_wire() {
        let trigger = TriggerRequest::new(42);
        let bytes = serde_json::to_vec(&trigger).unwrap();
        let decoded: TriggerRequest = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.connector_id, 42);
        assert!(!decoded.params.force_full);
    }

    #[test]
    fn test_params_default_when_absent() {
        let decoded: TriggerRequest = serde_json::from_str(r#"{"connector_id":7}"#).unwrap();
        assert_eq!(decoded.connector_id, 7);
        assert!(!decoded.params.force_full);
    }
}
