//! Runs one import against the file-backed store.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;

use distro_config::JsonFileStore;
use distro_import::{DialOptions, ImportStatus, Importer};

/// Activates once and waits for the outcome. Ctrl-C closes the connection
/// and still waits for the completion.
pub async fn run(store_path: PathBuf, dial: DialOptions) -> anyhow::Result<ImportStatus> {
    let store = Arc::new(JsonFileStore::open(store_path)?);
    let importer = Importer::new(store);

    let (tx, mut rx) = oneshot::channel();
    let disconnect = importer.activate_with(dial, move |completion| {
        let _ = tx.send(completion.status);
    });

    let status = tokio::select! {
        status = &mut rx => status?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, disconnecting");
            disconnect.disconnect();
            rx.await?
        }
    };
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_store_is_canceled() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"import": false}"#).unwrap();

        let status = run(path, DialOptions::default()).await.unwrap();
        assert_eq!(status, ImportStatus::Canceled);
        assert!(!status.is_failure());
    }

    #[tokio::test]
    async fn unreadable_store_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(run(path, DialOptions::default()).await.is_err());
    }
}
