// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9._-]{1,32}$";

pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
pub const DEFAULT_LISTEN_PORT: u16 = 2121;
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 900;
/// Bound on how long a data-bearing command waits for its data connection.
pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/driverftpd.toml";

/// Longest control line accepted, CRLF included.
pub const MAX_COMMAND_LENGTH: usize = 4096;

pub const TRANSFER_BUFFER_SIZE: usize = 64 * 1024;

pub const SYSTEM_TYPE: &str = "UNIX Type: L8";
