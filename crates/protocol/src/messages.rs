use serde::{Deserialize, Serialize};

/// Full configuration snapshot pushed with the `config` event.
pub type ConfigSnapshot = serde_json::Map<String, serde_json::Value>;

/// Single key update pushed with the `change` event (listen mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub key: String,
    pub value: serde_json::Value,
}

/// Payload of a server-side `error` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_wire_shape() {
        let change = ConfigChange {
            key: "port".into(),
            value: serde_json::json!(8000),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json, serde_json::json!({"key": "port", "value": 8000}));
    }

    #[test]
    fn snapshot_parses_object() {
        let snapshot: ConfigSnapshot =
            serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], serde_json::json!(2));
    }
}
