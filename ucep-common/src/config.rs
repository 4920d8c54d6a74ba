//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `UCEP_ROOT` environment variable
//! 3. `root_folder` key in the TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup; it is logged and
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the root folder
pub const ROOT_ENV_VAR: &str = "UCEP_ROOT";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "ucep.db";

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Contents of `config.toml`
///
/// Every field is optional so partial files are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    /// tracing-subscriber `EnvFilter` directive, e.g. `"info,ucep_api=debug"`
    pub log_filter: Option<String>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the platform config location, falling back to defaults
    pub fn load_or_default() -> Self {
        let Some(path) = default_config_file() else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// `host:port` string for binding the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!(
            "{}:{}",
            self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS),
            self.port.unwrap_or(DEFAULT_PORT)
        )
    }
}

/// Resolves the root folder for a UCEP binary
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml: Option<TomlConfig>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml: None,
        }
    }

    /// Command-line override (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Use an already-loaded TOML config instead of reading the platform file
    pub fn with_toml(mut self, toml: TomlConfig) -> Self {
        self.toml = Some(toml);
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            debug!(module = %self.module_name, "Root folder from command line");
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
            if !path.trim().is_empty() {
                debug!(module = %self.module_name, "Root folder from {}", ROOT_ENV_VAR);
                return PathBuf::from(path);
            }
        }

        let toml = match &self.toml {
            Some(toml) => toml.clone(),
            None => TomlConfig::load_or_default(),
        };
        if let Some(root) = toml.root_folder.filter(|r| !r.trim().is_empty()) {
            debug!(module = %self.module_name, "Root folder from TOML config");
            return PathBuf::from(root);
        }

        default_root_folder()
    }
}

/// Creates the root folder and derives paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            tracing::info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}

/// First existing config file: `~/.config/ucep/config.toml`, then `/etc/ucep/config.toml`
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ucep").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/ucep/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/ucep (or /var/lib/ucep for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("ucep"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/ucep"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("ucep"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/ucep"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("ucep"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\ucep"))
    } else {
        PathBuf::from("./ucep_data")
    }
}
