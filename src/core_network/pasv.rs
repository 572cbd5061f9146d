use crate::core_driver::Driver;
use crate::core_network::error::TransferError;
use crate::core_network::transfer::{TransferHandler, TransferTimestamps};
use crate::session::{Session, SessionError};
use chrono::Local;
use log::{debug, info, trace, warn};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// A listener waiting for exactly one data connection from the client.
///
/// The accept runs on its own task as soon as the listener is bound, so the
/// 227/229 reply never waits on it. The result comes back through a oneshot
/// channel that [`PassiveHandler::open`] waits on with a timeout.
pub struct PassiveHandler {
    port: u16,
    origin: String,
    accept_rx: Option<oneshot::Receiver<io::Result<TcpStream>>>,
    accept_task: JoinHandle<()>,
    timestamps: TransferTimestamps,
}

impl PassiveHandler {
    /// Binds a listener on `bind_ip` and starts the background accept.
    ///
    /// `origin` names the command that opened the listener and is only used for logging.
    pub async fn listen(
        bind_ip: IpAddr,
        ports: Option<&RangeInclusive<u16>>,
        origin: String,
    ) -> Result<Self, TransferError> {
        let listener = bind_passive_listener(bind_ip, ports).await?;
        let port = listener.local_addr().map_err(TransferError::Bind)?.port();
        debug!("PASV listener set up on {}:{} for {:?}", bind_ip, port, origin);

        let (accept_tx, accept_rx) = oneshot::channel();
        let task_origin = origin.clone();
        let accept_task = tokio::spawn(async move {
            let result = accept_pasv_connection(listener, &task_origin).await;
            // Nobody waiting any more is fine: the handler was closed first.
            let _ = accept_tx.send(result);
        });

        Ok(Self {
            port,
            origin,
            accept_rx: Some(accept_rx),
            accept_task,
            timestamps: TransferTimestamps::default(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timestamps(&self) -> &TransferTimestamps {
        &self.timestamps
    }

    /// Waits up to `wait` for the background accept to hand over the data connection.
    pub async fn open(&mut self, wait: Duration) -> Result<TcpStream, TransferError> {
        let accept_rx = self.accept_rx.take().ok_or(TransferError::Consumed)?;

        let result = match timeout(wait, accept_rx).await {
            Ok(Ok(Ok(stream))) => Ok(stream),
            Ok(Ok(Err(e))) => Err(TransferError::Accept(e)),
            Ok(Err(_)) => Err(TransferError::Accept(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "accept task ended without a connection",
            ))),
            Err(_) => Err(TransferError::AcceptTimeout),
        };

        match &result {
            Ok(_) => self.timestamps.listen_success = Some(Local::now()),
            Err(e) => {
                warn!("Passive data connection for {:?} failed: {}", self.origin, e);
                self.timestamps.listen_failure = Some(Local::now());
            }
        }
        result
    }

    /// Stops listening. A connection accepted but never opened is dropped.
    pub fn close(&mut self) {
        self.accept_task.abort();
        let failed = match self.accept_rx.take() {
            Some(mut accept_rx) => matches!(accept_rx.try_recv(), Ok(Err(_))),
            None => false,
        };
        if failed {
            self.timestamps.close_failure = Some(Local::now());
        } else {
            self.timestamps.close_success = Some(Local::now());
        }
        trace!(
            "PASV handler on port {} closed ({:?})",
            self.port,
            self.timestamps
        );
    }
}

impl Drop for PassiveHandler {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

/// Binds the passive listener, walking the configured range or taking an ephemeral port.
pub async fn bind_passive_listener(
    bind_ip: IpAddr,
    ports: Option<&RangeInclusive<u16>>,
) -> Result<TcpListener, TransferError> {
    let range = match ports {
        Some(range) => range.clone(),
        None => return TcpListener::bind((bind_ip, 0)).await.map_err(TransferError::Bind),
    };

    for port in range {
        match TcpListener::bind((bind_ip, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => continue,
            Err(e) => return Err(TransferError::Bind(e)),
        }
    }
    Err(TransferError::NoAvailablePort)
}

/// Accepts the incoming connection on the passive listener, then drops the listener.
async fn accept_pasv_connection(listener: TcpListener, origin: &str) -> io::Result<TcpStream> {
    let (data_stream, addr) = listener.accept().await?;
    debug!("Accepted data connection from {} for {:?}", addr, origin);
    Ok(data_stream)
}

pub fn format_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [h1, h2, h3, h4] = ip.octets();
    format!(
        "227 Entering Passive Mode ({},{},{},{},{},{}).\r\n",
        h1,
        h2,
        h3,
        h4,
        port / 256,
        port % 256
    )
}

pub fn format_epsv_reply(port: u16) -> String {
    format!("229 Entering Extended Passive Mode (|||{}|)\r\n", port)
}

/// Drops any pending transfer handler, then opens a fresh passive listener.
async fn setup_passive<D: Driver>(session: &mut Session<D>) -> Result<u16, TransferError> {
    session.discard_transfer();

    let limit = session.ctx.settings.max_passive_per_session;
    if limit > 0 && session.passive_count >= limit {
        return Err(TransferError::PassiveLimit);
    }

    let bind_ip = match session.info.local_addr.ip() {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    let origin = format!("{} {}", session.last_command, session.last_param);
    let handler = PassiveHandler::listen(
        bind_ip,
        session.ctx.settings.passive_ports.as_ref(),
        origin.trim_end().to_string(),
    )
    .await?;
    let port = handler.port();

    session.passive_count += 1;
    session.ctx.registry.record_passive_listener();
    session.transfer = Some(TransferHandler::Passive(handler));
    info!(
        "Session {}: passive listener opened on port {}",
        session.info.id, port
    );
    Ok(port)
}

/// Handles the PASV command.
pub async fn handle_pasv_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    let advertised = match (session.ctx.settings.pasv_address, session.info.local_addr.ip()) {
        (Some(ip), _) => ip,
        (None, IpAddr::V4(ip)) => ip,
        (None, IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
            Some(ip) => ip,
            None => {
                return session
                    .send_response(b"550 PASV is IPv4 only, use EPSV.\r\n")
                    .await
            }
        },
    };

    match setup_passive(session).await {
        Ok(port) => {
            let reply = format_pasv_reply(advertised, port);
            debug!("PASV response sent to client: {}", reply.trim_end());
            session.send_response(reply.as_bytes()).await
        }
        Err(e) => session.send_response(e.to_ftp_response().as_bytes()).await,
    }
}

/// Handles the EPSV command (RFC 2428).
pub async fn handle_epsv_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    if arg.trim().eq_ignore_ascii_case("ALL") {
        return session.reply(200, "EPSV ALL ok.").await;
    }

    match setup_passive(session).await {
        Ok(port) => session.send_response(format_epsv_reply(port).as_bytes()).await,
        Err(e) => session.send_response(e.to_ftp_response().as_bytes()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn pasv_reply_splits_port_into_base_256_digits() {
        assert_eq!(
            format_pasv_reply(Ipv4Addr::new(192, 168, 1, 2), 50001),
            "227 Entering Passive Mode (192,168,1,2,195,81).\r\n"
        );
        assert_eq!(
            format_epsv_reply(50001),
            "229 Entering Extended Passive Mode (|||50001|)\r\n"
        );
    }

    #[tokio::test]
    async fn open_returns_the_accepted_connection() {
        let mut handler = PassiveHandler::listen(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            None,
            "PASV".to_string(),
        )
        .await
        .unwrap();
        let port = handler.port();

        let mut client = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        client.write_all(b"ping").await.unwrap();

        let mut stream = handler.open(Duration::from_secs(5)).await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        assert!(handler.timestamps().listen_success.is_some());

        assert!(matches!(
            handler.open(Duration::from_secs(1)).await,
            Err(TransferError::Consumed)
        ));
        handler.close();
        assert!(handler.timestamps().close_success.is_some());
    }

    #[tokio::test]
    async fn open_times_out_without_a_client() {
        let mut handler = PassiveHandler::listen(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            None,
            "PASV".to_string(),
        )
        .await
        .unwrap();

        let result = handler.open(Duration::from_millis(100)).await;
        assert!(matches!(result, Err(TransferError::AcceptTimeout)));
        assert!(handler.timestamps().listen_failure.is_some());
    }

    #[tokio::test]
    async fn close_releases_the_port() {
        let mut handler = PassiveHandler::listen(
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            None,
            "PASV".to_string(),
        )
        .await
        .unwrap();
        let port = handler.port();
        handler.close();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.is_err());
    }

    #[tokio::test]
    async fn range_skips_ports_in_use() {
        let taken = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = taken.local_addr().unwrap().port();
        let range = port..=port;

        let result = bind_passive_listener(IpAddr::V4(Ipv4Addr::LOCALHOST), Some(&range)).await;
        assert!(matches!(result, Err(TransferError::NoAvailablePort)));
    }
}
