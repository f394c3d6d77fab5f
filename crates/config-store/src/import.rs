//! Import settings read from the store at activation time.

use serde_json::Value;

use crate::store::ConfigStore;

/// Store key: whether importing from a distribution server is enabled.
pub const KEY_IMPORT: &str = "import";
/// Store key: base URL of the distribution server.
pub const KEY_IMPORT_URL: &str = "importUrl";
/// Store key: keep the connection open for change pushes.
pub const KEY_IMPORT_LISTEN: &str = "importListen";
/// Store key: token presented in the `auth` event.
pub const KEY_IMPORT_TOKEN: &str = "importToken";
/// Store key: this agent's display name.
pub const KEY_NAME: &str = "name";
/// Store key: this agent's listening port.
pub const KEY_PORT: &str = "port";

/// Snapshot of the import settings for one activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub enabled: bool,
    pub server_url: String,
    pub listen: bool,
    pub agent_name: Option<String>,
    pub agent_port: Option<u16>,
    /// Opaque; forwarded to the server as-is.
    pub auth_token: Value,
}

impl ImportConfig {
    /// Reads the import settings. Missing keys fall back to: disabled,
    /// empty URL, one-shot, no name or port, `null` token.
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        Self {
            enabled: store.get_flag(KEY_IMPORT),
            server_url: store.get_string(KEY_IMPORT_URL).unwrap_or_default(),
            listen: store.get_flag(KEY_IMPORT_LISTEN),
            agent_name: store.get_string(KEY_NAME).filter(|n| !n.is_empty()),
            agent_port: store.get(KEY_PORT).and_then(|v| port_from_value(&v)),
            auth_token: store.get(KEY_IMPORT_TOKEN).unwrap_or(Value::Null),
        }
    }
}

fn port_from_value(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn defaults_on_empty_store() {
        let config = ImportConfig::from_store(&MemoryStore::new());
        assert!(!config.enabled);
        assert!(config.server_url.is_empty());
        assert!(!config.listen);
        assert!(config.agent_name.is_none());
        assert!(config.agent_port.is_none());
        assert_eq!(config.auth_token, Value::Null);
    }

    #[test]
    fn reads_all_keys() {
        let store: MemoryStore = [
            (KEY_IMPORT, json!(true)),
            (KEY_IMPORT_URL, json!("https://hub.example")),
            (KEY_IMPORT_LISTEN, json!(true)),
            (KEY_IMPORT_TOKEN, json!("s3cret")),
            (KEY_NAME, json!("node1")),
            (KEY_PORT, json!(8080)),
        ]
        .into_iter()
        .collect();

        let config = ImportConfig::from_store(&store);
        assert_eq!(
            config,
            ImportConfig {
                enabled: true,
                server_url: "https://hub.example".into(),
                listen: true,
                agent_name: Some("node1".into()),
                agent_port: Some(8080),
                auth_token: json!("s3cret"),
            }
        );
    }

    #[test]
    fn port_accepts_strings_and_rejects_out_of_range() {
        let store: MemoryStore = [(KEY_PORT, json!("9000"))].into_iter().collect();
        assert_eq!(ImportConfig::from_store(&store).agent_port, Some(9000));

        let store: MemoryStore = [(KEY_PORT, json!(70000))].into_iter().collect();
        assert_eq!(ImportConfig::from_store(&store).agent_port, None);
    }

    #[test]
    fn empty_name_is_absent() {
        let store: MemoryStore = [(KEY_NAME, json!(""))].into_iter().collect();
        assert!(ImportConfig::from_store(&store).agent_name.is_none());
    }
}
