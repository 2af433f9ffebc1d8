use serde::{Deserialize, Serialize};

use crate::types::constants::STATUS_UPDATE_EVENT;

/// Decoded unit of inbound channel data.
///
/// Every frame on the push channel is a JSON object `{"type": ..., "data": ...}`.
/// Only `status_update` envelopes are delivered to subscribers; other types
/// are an extension point and are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub r#type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventEnvelope {
    pub fn is_status_update(&self) -> bool {
        self.r#type == STATUS_UPDATE_EVENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_update() {
        let envelope: EventEnvelope =
            serde_json::from_str(r#"{"type":"status_update","data":{"temp":42}}"#).unwrap();
        assert!(envelope.is_status_update());
        assert_eq!(envelope.data["temp"], 42);
    }

    #[test]
    fn test_missing_data_defaults_to_null() {
        let envelope: EventEnvelope = serde_json::from_str(r#"{"type":"pong"}"#).unwrap();
        assert!(!envelope.is_status_update());
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_unknown_type_is_not_actionable() {
        let envelope: EventEnvelope =
            serde_json::from_str(r#"{"type":"test","data":"ignored"}"#).unwrap();
        assert!(!envelope.is_status_update());
    }

    #[test]
    fn test_missing_type_is_a_parse_error() {
        let result = serde_json::from_str::<EventEnvelope>(r#"{"data":{"temp":42}}"#);
        assert!(result.is_err());
    }
}
