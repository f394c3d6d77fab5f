//! Key/value configuration store shared by the agent.
//!
//! The import client reads its settings from the store and merges pushed
//! configuration back into it. Backends: in-memory and a JSON file.

pub mod file;
pub mod import;
pub mod store;

pub use file::{JsonFileStore, config_dir, default_store_path};
pub use import::ImportConfig;
pub use store::{ConfigStore, MemoryStore, StoreError, merge_snapshot};
