use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

/// Errors from configuration store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store file does not hold a JSON object")]
    NotAnObject,
}

/// Process-wide configuration, addressed by key.
///
/// Writers overwrite keys (last write wins); there is no transactional
/// grouping across keys.
pub trait ConfigStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Reads `key` as a flag. Missing keys, `null`, `false`, `0` and `""`
    /// are all off; any other value is on.
    fn get_flag(&self, key: &str) -> bool {
        match self.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_) | Value::Object(_)) => true,
        }
    }

    /// Reads `key` as a string. Numbers and booleans are rendered.
    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Sets every key of `snapshot` into the store.
///
/// A failing key is logged and skipped; the rest of the snapshot is still
/// applied. Returns the number of keys written.
pub fn merge_snapshot(
    store: &dyn ConfigStore,
    snapshot: &serde_json::Map<String, Value>,
) -> usize {
    let mut written = 0;
    for (key, value) in snapshot {
        match store.set(key, value.clone()) {
            Ok(()) => written += 1,
            Err(e) => warn!(key = %key, error = %e, "failed to store config key"),
        }
    }
    debug!("merged {written}/{} key(s)", snapshot.len());
    written
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all stored keys.
    pub fn keys(&self) -> Vec<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: RwLock::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_set_and_get() {
        let store = MemoryStore::new();
        assert!(store.get("theme").is_none());
        store.set("theme", json!("dark")).unwrap();
        assert_eq!(store.get("theme"), Some(json!("dark")));
        store.set("theme", json!("light")).unwrap();
        assert_eq!(store.get("theme"), Some(json!("light")));
    }

    #[test]
    fn from_iter_seeds_values() {
        let store: MemoryStore = [("a", json!(1)), ("b", json!(true))].into_iter().collect();
        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn flag_truthiness() {
        let store: MemoryStore = [
            ("t", json!(true)),
            ("f", json!(false)),
            ("zero", json!(0)),
            ("one", json!(1)),
            ("empty", json!("")),
            ("text", json!("yes")),
            ("null", Value::Null),
            ("obj", json!({})),
        ]
        .into_iter()
        .collect();

        assert!(store.get_flag("t"));
        assert!(!store.get_flag("f"));
        assert!(!store.get_flag("zero"));
        assert!(store.get_flag("one"));
        assert!(!store.get_flag("empty"));
        assert!(store.get_flag("text"));
        assert!(!store.get_flag("null"));
        assert!(store.get_flag("obj"));
        assert!(!store.get_flag("missing"));
    }

    #[test]
    fn get_string_renders_scalars() {
        let store: MemoryStore = [("s", json!("x")), ("n", json!(8080)), ("a", json!([1]))]
            .into_iter()
            .collect();
        assert_eq!(store.get_string("s").as_deref(), Some("x"));
        assert_eq!(store.get_string("n").as_deref(), Some("8080"));
        assert_eq!(store.get_string("a"), None);
    }

    #[test]
    fn merge_writes_every_key() {
        let store = MemoryStore::new();
        store.set("keep", json!("me")).unwrap();
        let snapshot = json!({"theme": "dark", "editor": "dword"});
        let written = merge_snapshot(&store, snapshot.as_object().unwrap());
        assert_eq!(written, 2);
        assert_eq!(store.get("theme"), Some(json!("dark")));
        assert_eq!(store.get("editor"), Some(json!("dword")));
        assert_eq!(store.get("keep"), Some(json!("me")));
    }

    struct FailingStore;

    impl ConfigStore for FailingStore {
        fn get(&self, _key: &str) -> Option<Value> {
            None
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
            Err(StoreError::NotAnObject)
        }
    }

    #[test]
    fn merge_skips_failing_keys() {
        let snapshot = json!({"a": 1, "b": 2});
        assert_eq!(merge_snapshot(&FailingStore, snapshot.as_object().unwrap()), 0);
    }
}
