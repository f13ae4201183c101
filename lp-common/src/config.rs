//! Configuration loading and root folder resolution
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_ROOT_FOLDER: &str = "LP_ROOT_FOLDER";
pub const ENV_SEED_DIR: &str = "LP_SEED_DIR";
pub const ENV_HOST: &str = "LP_HOST";
pub const ENV_PORT: &str = "LP_PORT";
/// Overrides the location of the TOML config file
pub const ENV_CONFIG_FILE: &str = "LP_CONFIG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_SEED_DIR: &str = "seed";
pub const DATABASE_FILE_NAME: &str = "lang_portal.db";

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub root_folder: Option<String>,
    pub seed_dir: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub seed_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub root_folder: PathBuf,
    pub seed_dir: PathBuf,
    pub host: String,
    pub port: u16,
}

impl PortalConfig {
    /// Resolve configuration, reading the TOML file if one exists
    pub fn resolve(cli: &ConfigOverrides) -> Self {
        let file = config_file_path()
            .map(|path| load_toml_config(&path))
            .unwrap_or_default();
        Self::resolve_with(cli, &file)
    }

    /// Resolve configuration against an already-loaded TOML config
    pub fn resolve_with(cli: &ConfigOverrides, file: &TomlConfig) -> Self {
        let root_folder = cli
            .root_folder
            .clone()
            .or_else(|| env_path(ENV_ROOT_FOLDER))
            .or_else(|| file.root_folder.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_root_folder);

        let seed_dir = cli
            .seed_dir
            .clone()
            .or_else(|| env_path(ENV_SEED_DIR))
            .or_else(|| file.seed_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_DIR));

        let host = cli
            .host
            .clone()
            .or_else(|| std::env::var(ENV_HOST).ok())
            .or_else(|| file.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = cli
            .port
            .or_else(env_port)
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);

        Self {
            root_folder,
            seed_dir,
            host,
            port,
        }
    }

    /// Path of the SQLite database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    /// Create the root folder if it does not exist yet
    pub fn ensure_root_folder(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder).map_err(|e| {
                Error::Config(format!(
                    "Cannot create root folder {}: {}",
                    self.root_folder.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// `host:port` string for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_port() -> Option<u16> {
    let raw = std::env::var(ENV_PORT).ok()?;
    match raw.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(_) => {
            warn!("Ignoring invalid {}={:?}", ENV_PORT, raw);
            None
        }
    }
}

/// Parse TOML text into a [`TomlConfig`]
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
}

/// Load the TOML file at `path`
///
/// Missing or malformed files yield an empty config; startup never fails
/// because of the file.
pub fn load_toml_config(path: &Path) -> TomlConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return TomlConfig::default(),
    };
    match parse_toml_config(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("{} ({}), using defaults", e, path.display());
            TomlConfig::default()
        }
    }
}

/// Location of `config.toml` (`~/.config/lang-portal/config.toml` on Linux)
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_path(ENV_CONFIG_FILE) {
        return Some(path);
    }
    dirs::config_dir().map(|d| d.join("lang-portal").join("config.toml"))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lang-portal"))
        .unwrap_or_else(|| PathBuf::from("./lang_portal_data"))
}
