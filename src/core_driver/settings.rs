use crate::constants::{
    DEFAULT_DATA_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_LISTEN_HOST,
    DEFAULT_LISTEN_PORT, DEFAULT_MAX_CONNECTIONS,
};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Server-wide settings handed out by a driver and read once by the server.
#[derive(Debug, Clone)]
pub struct Settings {
    pub listen_host: String,
    pub listen_port: u16,
    /// Live sessions allowed at once; 0 disables the limit.
    pub max_connections: usize,
    /// Passive listeners one session may open over its life; 0 disables the limit.
    pub max_passive_per_session: usize,
    pub idle_timeout: Duration,
    pub data_timeout: Duration,
    /// Address advertised in 227 replies. Defaults to the control connection's local address.
    pub pasv_address: Option<Ipv4Addr>,
    /// Ports tried in order for PASV/EPSV listeners. Ephemeral when absent.
    pub passive_ports: Option<RangeInclusive<u16>>,
    /// Local port bound before dialing out for PORT/EPRT. Ephemeral when absent.
    pub active_port: Option<u16>,
}

impl Settings {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_passive_per_session: 0,
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            data_timeout: Duration::from_secs(DEFAULT_DATA_TIMEOUT_SECS),
            pasv_address: None,
            passive_ports: None,
            active_port: None,
        }
    }
}
