//! Configuration loading and root folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, applied by the binaries)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed config file is never fatal: defaults apply and the
//! outcome is reported through [`LoadedConfig::log`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "PERFMAP_ROOT_FOLDER";

/// Environment variable pointing at a TOML config file
pub const CONFIG_PATH_ENV: &str = "PERFMAP_CONFIG";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Poster uploads are limited to 5 MiB
pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_MAP_URL: &str = "https://geo.datav.aliyun.com/areas_v3/bound/100000_full.json";

const DATABASE_FILE: &str = "perfmap.db";
const UPLOADS_DIR: &str = "uploads";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[server]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub max_connections: Option<u32>,
    pub upload_limit_bytes: Option<usize>,
}

/// `[client]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSection {
    pub api_base_url: Option<String>,
    pub map_url: Option<String>,
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file; a malformed file is an error
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the config file if present, otherwise fall back to defaults
    ///
    /// `explicit` comes from the command line; without it the environment
    /// variable and then the platform config directory are consulted. Nothing
    /// is logged here: tracing is configured from the result, so the binaries
    /// call [`LoadedConfig::log`] once the subscriber is installed.
    pub fn load_or_default(explicit: Option<&Path>) -> LoadedConfig {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let Some(path) = path else {
            return LoadedConfig::fallback(ConfigOrigin::NoConfigDir);
        };

        if !path.exists() {
            return LoadedConfig::fallback(ConfigOrigin::Missing(path));
        }

        match Self::load(&path) {
            Ok(config) => LoadedConfig {
                config,
                origin: ConfigOrigin::File(path),
            },
            Err(e) => LoadedConfig::fallback(ConfigOrigin::Invalid {
                path,
                error: e.to_string(),
            }),
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    /// The file exists but could not be read or parsed
    Invalid { path: PathBuf, error: String },
    NoConfigDir,
}

/// Result of [`TomlConfig::load_or_default`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub origin: ConfigOrigin,
}

impl LoadedConfig {
    fn fallback(origin: ConfigOrigin) -> Self {
        Self {
            config: TomlConfig::default(),
            origin,
        }
    }

    pub fn used_defaults(&self) -> bool {
        !matches!(self.origin, ConfigOrigin::File(_))
    }

    /// Report the outcome of loading; call after tracing init
    pub fn log(&self) {
        match &self.origin {
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Missing(path) => {
                warn!("Config file {} not found, using defaults", path.display())
            }
            ConfigOrigin::Invalid { error, .. } => warn!("{}; using defaults", error),
            ConfigOrigin::NoConfigDir => {
                warn!("No config directory available on this platform, using defaults")
            }
        }
    }
}

/// `~/.config/perfmap/config.toml` (or the platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("perfmap").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("perfmap"))
        .unwrap_or_else(|| PathBuf::from("./perfmap_data"))
}

/// Resolves the root folder holding the database and uploaded posters
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    /// Resolve using CLI → ENV → TOML → default
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("[{}] Root folder from command line: {}", self.module_name, path.display());
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("[{}] Root folder from {}: {}", self.module_name, ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!("[{}] Root folder from config file: {}", self.module_name, path.display());
            return path.clone();
        }

        let path = default_root_folder();
        info!("[{}] Root folder (default): {}", self.module_name, path.display());
        path
    }
}

/// Creates the root folder layout on first run
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root folder and the uploads directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(self.uploads_path())?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }
}

/// Effective server settings after applying defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub max_connections: u32,
    pub upload_limit_bytes: usize,
}

impl ServerSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let section = &config.server;
        Self {
            bind: section.bind.clone().unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: section.port.unwrap_or(DEFAULT_PORT),
            max_connections: section.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS).max(1),
            upload_limit_bytes: section
                .upload_limit_bytes
                .unwrap_or(DEFAULT_UPLOAD_LIMIT_BYTES),
        }
    }

    /// Accepts IPv4 and bare IPv6 addresses (`::`, `::1`)
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let bind = self.bind.trim().trim_start_matches('[').trim_end_matches(']');
        let ip: IpAddr = bind
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address {}: {}", self.bind, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}

/// Effective client settings after applying defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub map_url: String,
}

impl ClientSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        let section = &config.client;
        Self {
            api_base_url: section
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            map_url: section
                .map_url
                .clone()
                .unwrap_or_else(|| DEFAULT_MAP_URL.to_string()),
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default())
    }
}
