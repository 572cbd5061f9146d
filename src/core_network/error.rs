// Data-channel setup and transfer errors
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("No data connection. Use PORT or PASV first.")]
    NoPendingHandler,

    #[error("Syntax error in parameters or arguments: {0}")]
    InvalidArgument(String),

    #[error("Failed to bind passive listener: {0}")]
    Bind(#[source] io::Error),

    #[error("No passive port available")]
    NoAvailablePort,

    #[error("Passive listener limit reached for this session")]
    PassiveLimit,

    #[error("Timed out waiting for data connection")]
    AcceptTimeout,

    #[error("Failed to accept data connection: {0}")]
    Accept(#[source] io::Error),

    #[error("Failed to connect to {0}: {1}")]
    Connect(SocketAddr, #[source] io::Error),

    #[error("Data connection already consumed")]
    Consumed,

    #[error("Data connection TLS handshake failed: {0}")]
    Tls(String),
}

impl TransferError {
    pub fn to_ftp_response(&self) -> String {
        match self {
            TransferError::InvalidArgument(_) => format!("501 {}\r\n", self),
            _ => format!("550 {}\r\n", self),
        }
    }
}
