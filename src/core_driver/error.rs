// Errors surfaced by driver implementations
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Authentication failed for user {0}")]
    AuthenticationFailed(String),

    #[error("TLS is not available")]
    NoTlsAvailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// Converts an I/O error into the closest driver error for `path`.
    pub fn from_io(err: io::Error, path: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => DriverError::NotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => DriverError::PermissionDenied(path.to_string()),
            io::ErrorKind::AlreadyExists => DriverError::AlreadyExists(path.to_string()),
            _ => DriverError::Io(err),
        }
    }

    pub fn to_ftp_response(&self) -> String {
        match self {
            DriverError::AuthenticationFailed(_) => "530 Login incorrect.\r\n".to_string(),
            DriverError::NoTlsAvailable => "550 TLS not available.\r\n".to_string(),
            _ => format!("550 {}\r\n", self),
        }
    }
}
