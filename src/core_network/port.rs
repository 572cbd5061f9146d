use crate::core_driver::Driver;
use crate::core_network::error::TransferError;
use crate::core_network::transfer::{TransferHandler, TransferTimestamps};
use crate::session::{Session, SessionError};
use chrono::Local;
use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;

/// Parses the PORT argument `h1,h2,h3,h4,p1,p2`.
pub fn parse_port_arg(arg: &str) -> Result<SocketAddr, TransferError> {
    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return Err(TransferError::InvalidArgument(format!(
            "expected h1,h2,h3,h4,p1,p2, got {:?}",
            arg
        )));
    }

    let mut bytes = [0u8; 6];
    for (slot, part) in bytes.iter_mut().zip(&parts) {
        *slot = part.trim().parse::<u8>().map_err(|_| {
            TransferError::InvalidArgument(format!("{:?} is not a byte value", part))
        })?;
    }

    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = u16::from(bytes[4]) * 256 + u16::from(bytes[5]);
    if port == 0 {
        return Err(TransferError::InvalidArgument("port 0".into()));
    }
    Ok(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Parses the EPRT argument `<d>proto<d>address<d>port<d>` (RFC 2428).
pub fn parse_eprt_arg(arg: &str) -> Result<SocketAddr, TransferError> {
    let arg = arg.trim();
    let delimiter = arg
        .chars()
        .next()
        .ok_or_else(|| TransferError::InvalidArgument("empty EPRT argument".into()))?;

    let fields: Vec<&str> = arg.split(delimiter).collect();
    // Leading and trailing delimiters produce empty first and last fields.
    if fields.len() != 5 || !fields[0].is_empty() || !fields[4].is_empty() {
        return Err(TransferError::InvalidArgument(format!(
            "malformed EPRT argument {:?}",
            arg
        )));
    }

    let ip: IpAddr = match fields[1] {
        "1" => fields[2].parse::<Ipv4Addr>().map(IpAddr::V4),
        "2" => fields[2].parse::<Ipv6Addr>().map(IpAddr::V6),
        other => {
            return Err(TransferError::InvalidArgument(format!(
                "unsupported network protocol {:?}",
                other
            )))
        }
    }
    .map_err(|_| TransferError::InvalidArgument(format!("bad address {:?}", fields[2])))?;

    let port = fields[3]
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| TransferError::InvalidArgument(format!("bad port {:?}", fields[3])))?;

    Ok(SocketAddr::new(ip, port))
}

/// Dials the client's advertised address when a data-bearing command needs it.
pub struct ActiveHandler {
    remote: SocketAddr,
    local_port: Option<u16>,
    dialed: bool,
    timestamps: TransferTimestamps,
}

impl ActiveHandler {
    pub fn new(remote: SocketAddr, local_port: Option<u16>) -> Self {
        Self {
            remote,
            local_port,
            dialed: false,
            timestamps: TransferTimestamps::default(),
        }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn timestamps(&self) -> &TransferTimestamps {
        &self.timestamps
    }

    /// Connects to the client, binding the configured source port when there is one.
    pub async fn open(&mut self, wait: Duration) -> Result<TcpStream, TransferError> {
        if self.dialed {
            return Err(TransferError::Consumed);
        }
        self.dialed = true;

        let result = match timeout(wait, self.dial()).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::Connect(
                self.remote,
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            )),
        };

        match &result {
            Ok(_) => self.timestamps.listen_success = Some(Local::now()),
            Err(e) => {
                warn!("Active data connection to {} failed: {}", self.remote, e);
                self.timestamps.listen_failure = Some(Local::now());
            }
        }
        result
    }

    async fn dial(&self) -> Result<TcpStream, TransferError> {
        let local_port = match self.local_port {
            Some(port) => port,
            None => {
                return TcpStream::connect(self.remote)
                    .await
                    .map_err(|e| TransferError::Connect(self.remote, e))
            }
        };

        let (socket, bind_ip) = match self.remote {
            SocketAddr::V4(_) => (TcpSocket::new_v4(), IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            SocketAddr::V6(_) => (TcpSocket::new_v6(), IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
        };
        let socket = socket.map_err(TransferError::Bind)?;
        socket.set_reuseaddr(true).map_err(TransferError::Bind)?;
        socket
            .bind(SocketAddr::new(bind_ip, local_port))
            .map_err(TransferError::Bind)?;
        socket
            .connect(self.remote)
            .await
            .map_err(|e| TransferError::Connect(self.remote, e))
    }

    /// Nothing is held open before [`ActiveHandler::open`]; closing only records the event.
    pub fn close(&mut self) {
        self.timestamps.close_success = Some(Local::now());
        debug!("Active handler for {} closed", self.remote);
    }
}

async fn setup_active<D: Driver>(
    session: &mut Session<D>,
    remote: SocketAddr,
) -> Result<(), SessionError> {
    // The data connection may only go back to the host on the control connection.
    if remote.ip().to_canonical() != session.info.peer_addr.ip().to_canonical() {
        warn!(
            "Session {}: refusing data connection to {} (control peer is {})",
            session.info.id, remote, session.info.peer_addr
        );
        return session
            .reply(501, "Data connection address must match the control connection.")
            .await;
    }

    session.discard_transfer();
    session.transfer = Some(TransferHandler::Active(ActiveHandler::new(
        remote,
        session.ctx.settings.active_port,
    )));
    info!("Session {}: active mode to {}", session.info.id, remote);
    session.reply(200, "Command okay.").await
}

/// Handles the PORT command.
pub async fn handle_port_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received PORT command with argument: {}", arg);
    match parse_port_arg(&arg) {
        Ok(remote) => setup_active(session, remote).await,
        Err(e) => session.send_response(e.to_ftp_response().as_bytes()).await,
    }
}

/// Handles the EPRT command.
pub async fn handle_eprt_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received EPRT command with argument: {}", arg);
    match parse_eprt_arg(&arg) {
        Ok(remote) => setup_active(session, remote).await,
        Err(e) => session.send_response(e.to_ftp_response().as_bytes()).await,
    }
}
