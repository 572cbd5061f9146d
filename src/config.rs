use crate::constants::{
    DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LISTEN_HOST,
    DEFAULT_LISTEN_PORT, DEFAULT_MAX_CONNECTIONS,
};
use crate::core_driver::{DriverError, Settings};
use crate::core_tls::TlsConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_host: String,
    pub listen_port: u16,
    pub max_connections: usize,
    pub max_passive_per_session: usize,
    /// Seconds without a command before the session is closed with 421.
    pub idle_timeout: u64,
    /// Seconds a data-bearing command waits for its data connection.
    pub data_timeout: u64,
    pub pasv_address: Option<String>, // Public IPv4 address advertised for PASV
    pub passive_ports: Option<[u16; 2]>,
    pub active_port: Option<u16>,
    pub root_dir: PathBuf,
    pub passwd_file: PathBuf,
    pub banner: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_passive_per_session: 0,
            idle_timeout: DEFAULT_IDLE_TIMEOUT_SECS,
            data_timeout: DEFAULT_DATA_TIMEOUT_SECS,
            pasv_address: None,
            passive_ports: None,
            active_port: None,
            root_dir: PathBuf::from("/var/ftp"),
            passwd_file: PathBuf::from("/etc/driverftpd.passwd"),
            banner: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        let config = Self::from_toml_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    /// Validates the `[server]` section and converts it into driver settings.
    pub fn settings(&self) -> Result<Settings, DriverError> {
        let server = &self.server;

        let pasv_address = match &server.pasv_address {
            Some(addr) => Some(addr.parse::<Ipv4Addr>().map_err(|e| {
                DriverError::Config(format!("invalid pasv_address {:?}: {}", addr, e))
            })?),
            None => None,
        };

        let passive_ports = match server.passive_ports {
            Some([low, high]) if low == 0 || low > high => {
                return Err(DriverError::Config(format!(
                    "invalid passive_ports range [{}, {}]",
                    low, high
                )))
            }
            Some([low, high]) => Some(low..=high),
            None => None,
        };

        if server.idle_timeout == 0 {
            return Err(DriverError::Config("idle_timeout must be positive".into()));
        }

        Ok(Settings {
            listen_host: server.listen_host.clone(),
            listen_port: server.listen_port,
            max_connections: server.max_connections,
            max_passive_per_session: server.max_passive_per_session,
            idle_timeout: Duration::from_secs(server.idle_timeout),
            data_timeout: Duration::from_secs(server.data_timeout.max(1)),
            pasv_address,
            passive_ports,
            active_port: server.active_port,
        })
    }
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    log::info!("  Listen Address: {}:{}", config.server.listen_host, config.server.listen_port);
    log::info!("  Max Connections: {}", config.server.max_connections);
    log::info!("  Idle Timeout: {}s", config.server.idle_timeout);
    log::info!("  PASV Address: {:?}", config.server.pasv_address);
    log::info!("  Passive Ports: {:?}", config.server.passive_ports);
    log::info!("  Root Directory: {}", config.server.root_dir.display());
    log::info!("  TLS Enabled: {}", config.tls.enabled);
}
