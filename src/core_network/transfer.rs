use crate::core_network::error::TransferError;
use crate::core_network::pasv::PassiveHandler;
use crate::core_network::port::ActiveHandler;
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Byte stream of an established data connection, plain or TLS-wrapped.
pub trait DataConnection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DataConnection for T {}

pub type DataStream = Box<dyn DataConnection>;

/// Lifecycle timestamps kept for logging.
#[derive(Debug, Default, Clone)]
pub struct TransferTimestamps {
    pub listen_success: Option<DateTime<Local>>,
    pub listen_failure: Option<DateTime<Local>>,
    pub close_success: Option<DateTime<Local>>,
    pub close_failure: Option<DateTime<Local>>,
}

/// The pending data connection of a session, set up by PASV/EPSV or PORT/EPRT.
///
/// A handler is consumed by the next data-bearing command: the session takes it,
/// opens it and closes it whatever the outcome.
pub enum TransferHandler {
    Passive(PassiveHandler),
    Active(ActiveHandler),
}

impl TransferHandler {
    pub async fn open(&mut self, wait: Duration) -> Result<TcpStream, TransferError> {
        match self {
            TransferHandler::Passive(handler) => handler.open(wait).await,
            TransferHandler::Active(handler) => handler.open(wait).await,
        }
    }

    pub fn close(&mut self) {
        match self {
            TransferHandler::Passive(handler) => handler.close(),
            TransferHandler::Active(handler) => handler.close(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TransferHandler::Passive(_) => "passive",
            TransferHandler::Active(_) => "active",
        }
    }
}
