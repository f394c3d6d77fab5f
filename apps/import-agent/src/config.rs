//! Agent configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/distro/import-agent.toml`
//! - Windows: `%APPDATA%/distro/import-agent.toml`

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use distro_config::{config_dir, default_store_path};
use distro_import::DialOptions;

/// Agent configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// JSON key/value store the import reads from and writes to.
    /// Defaults to `config.json` next to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Transport options for the distribution server.
    #[serde(default)]
    pub dial: DialOptions,
}

impl AgentConfig {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AgentConfig = toml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?;
            Ok(config)
        } else {
            let config = AgentConfig::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// The store path, falling back to the platform default.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        self.store_path
            .clone()
            .or_else(default_store_path)
            .context("no config directory for the store")
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    let dir = config_dir().context("no config directory")?;
    Ok(dir.join("distro").join("import-agent.toml"))
}
