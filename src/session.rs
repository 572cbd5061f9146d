use crate::constants::MAX_COMMAND_LENGTH;
use crate::core_driver::{Driver, SessionInfo};
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_network::{ControlChannel, DataStream, TransferError, TransferHandler};
use crate::core_tls::TlsError;
use crate::server::ServerContext;
use log::{debug, info, warn};
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls;
use tokio_rustls::TlsAcceptor;

pub(crate) const NOT_LOGGED_IN: &[u8] = b"530 Not logged in.\r\n";

/// Reasons a session ends other than QUIT or the client hanging up.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("control connection I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("idle timeout")]
    IdleTimeout,

    #[error("TLS upgrade failed: {0}")]
    Tls(#[from] TlsError),
}

pub enum AuthState<H> {
    Unauthenticated,
    PendingPassword(String),
    Authenticated { user: String, handle: H },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Ascii => "ASCII",
            TransferType::Binary => "BINARY",
        }
    }
}

/// Per-connection protocol state. Owned by the task serving the connection.
pub struct Session<D: Driver> {
    pub(crate) ctx: Arc<ServerContext<D>>,
    pub(crate) info: SessionInfo,
    control: ControlChannel,
    pub(crate) auth: AuthState<D::Handle>,
    pub(crate) current_dir: String,
    pub(crate) transfer_type: TransferType,
    pub(crate) rename_from: Option<String>,
    pub(crate) last_command: String,
    pub(crate) last_param: String,
    pub(crate) last_activity: Instant,
    pub(crate) transfer: Option<TransferHandler>,
    /// Passive listeners opened so far.
    pub(crate) passive_count: usize,
    pub(crate) protected_data: bool,
    closing: bool,
}

/// Splits a raw command line into the upper-cased verb and its parameter.
pub fn parse_command_line(line: &str) -> (String, String) {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.trim_start();
    match line.split_once(' ') {
        Some((verb, param)) => (verb.to_ascii_uppercase(), param.trim().to_string()),
        None => (line.to_ascii_uppercase(), String::new()),
    }
}

impl<D: Driver> Session<D> {
    pub fn new(ctx: Arc<ServerContext<D>>, socket: TcpStream, info: SessionInfo) -> Self {
        Self {
            ctx,
            info,
            control: ControlChannel::new(socket),
            auth: AuthState::Unauthenticated,
            current_dir: String::from("/"),
            transfer_type: TransferType::Binary,
            rename_from: None,
            last_command: String::new(),
            last_param: String::new(),
            last_activity: Instant::now(),
            transfer: None,
            passive_count: 0,
            protected_data: false,
            closing: false,
        }
    }

    /// Serves the connection until QUIT, disconnect, idle timeout or a fatal error.
    pub async fn run(mut self) -> Result<(), SessionError> {
        let result = self.serve().await;
        self.finish().await;
        result
    }

    async fn serve(&mut self) -> Result<(), SessionError> {
        let greeting = match self.ctx.driver.welcome_user(&self.info).await {
            Ok(greeting) => greeting,
            Err(e) => {
                warn!("Session {}: driver refused greeting: {}", self.info.id, e);
                return self.reply(421, "Service not available, closing control connection.").await;
            }
        };
        self.reply_multiline(220, &greeting).await?;

        let idle_timeout = self.ctx.settings.idle_timeout;
        let mut line = Vec::with_capacity(256);

        while !self.closing {
            line.clear();
            let read = timeout(
                idle_timeout,
                self.control.read_line(&mut line, MAX_COMMAND_LENGTH as u64),
            )
            .await;

            let n = match read {
                Ok(result) => result?,
                Err(_) => return self.expire_idle().await,
            };

            if n == 0 {
                info!("Session {}: client disconnected", self.info.id);
                break;
            }
            if n >= MAX_COMMAND_LENGTH && !line.ends_with(b"\n") {
                // The rest of the line is dropped, never parsed as a command.
                match timeout(idle_timeout, self.control.discard_line()).await {
                    Ok(result) => result?,
                    Err(_) => return self.expire_idle().await,
                }
                self.reply(500, "Command line too long.").await?;
                continue;
            }

            let text = String::from_utf8_lossy(&line);
            let (verb, param) = parse_command_line(&text);
            if verb.is_empty() {
                continue;
            }

            self.last_activity = Instant::now();
            if verb == "PASS" {
                debug!("Session {}: received command: PASS ****", self.info.id);
            } else {
                debug!("Session {}: received command: {} {}", self.info.id, verb, param);
            }
            self.last_command = verb.clone();
            self.last_param = param.clone();

            self.dispatch(&verb, param).await?;
        }
        Ok(())
    }

    async fn expire_idle(&mut self) -> Result<(), SessionError> {
        info!(
            "Session {}: idle for {:?}, closing",
            self.info.id,
            self.last_activity.elapsed()
        );
        // The peer may already be gone; the session ends either way.
        let _ = self
            .reply(421, "Idle timeout, closing control connection.")
            .await;
        Err(SessionError::IdleTimeout)
    }

    async fn dispatch(&mut self, verb: &str, param: String) -> Result<(), SessionError> {
        let spec = FtpCommand::from_str(verb)
            .ok()
            .and_then(|command| self.ctx.commands.get(&command))
            .map(|spec| (spec.handler, spec.requires_auth));

        let (handler, requires_auth) = match spec {
            Some(spec) => spec,
            None => {
                let msg = format!("'{}': command not understood.", verb);
                return self.reply(500, &msg).await;
            }
        };

        if requires_auth && !self.is_authenticated() {
            return self.reply(530, "Please login with USER and PASS.").await;
        }

        handler(self, param).await
    }

    async fn finish(&mut self) {
        self.discard_transfer();
        if self.is_authenticated() {
            info!(
                "Session {}: user {} left",
                self.info.id,
                self.username().unwrap_or("-")
            );
            self.ctx.driver.user_left(&self.info).await;
        }
        if let Err(e) = self.control.shutdown().await {
            debug!("Session {}: control shutdown: {}", self.info.id, e);
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated { .. })
    }

    pub fn handle(&self) -> Option<&D::Handle> {
        match &self.auth {
            AuthState::Authenticated { handle, .. } => Some(handle),
            _ => None,
        }
    }

    /// The driver together with the login handle, once authenticated.
    pub(crate) fn driver_handle(&self) -> Option<(&D, &D::Handle)> {
        self.handle().map(|handle| (self.ctx.driver.as_ref(), handle))
    }

    pub fn username(&self) -> Option<&str> {
        match &self.auth {
            AuthState::Authenticated { user, .. } => Some(user),
            AuthState::PendingPassword(user) => Some(user),
            AuthState::Unauthenticated => None,
        }
    }

    /// Ends the session after the current command.
    pub(crate) fn close(&mut self) {
        self.closing = true;
    }

    pub async fn send_response(&mut self, msg: &[u8]) -> Result<(), SessionError> {
        self.control.write_all(msg).await?;
        Ok(())
    }

    pub async fn reply(&mut self, code: u16, text: &str) -> Result<(), SessionError> {
        self.send_response(format!("{} {}\r\n", code, text).as_bytes())
            .await
    }

    /// Sends `text` as a multi-line reply: `code-` on every line but the last.
    pub async fn reply_multiline(&mut self, code: u16, text: &str) -> Result<(), SessionError> {
        let lines: Vec<&str> = text.lines().collect();
        let (last, rest) = match lines.split_last() {
            Some(split) => split,
            None => return self.reply(code, "").await,
        };

        let mut out = String::new();
        for line in rest {
            out.push_str(&format!("{}-{}\r\n", code, line));
        }
        out.push_str(&format!("{} {}\r\n", code, last));
        self.send_response(out.as_bytes()).await
    }

    pub fn is_tls(&self) -> bool {
        self.control.is_tls()
    }

    /// Upgrades the control connection. A failed handshake leaves it unusable.
    pub(crate) async fn start_tls(
        &mut self,
        config: Arc<rustls::ServerConfig>,
    ) -> Result<(), SessionError> {
        self.control.upgrade(TlsAcceptor::from(config)).await?;
        info!("Session {}: control connection upgraded to TLS", self.info.id);
        Ok(())
    }

    /// Drops the pending transfer handler, if any.
    pub(crate) fn discard_transfer(&mut self) {
        if let Some(mut handler) = self.transfer.take() {
            debug!(
                "Session {}: discarding pending {} handler",
                self.info.id,
                handler.kind()
            );
            handler.close();
        }
    }

    /// Consumes the pending transfer handler and returns its data connection.
    ///
    /// The handler is closed whether or not the connection comes up. With PROT P
    /// and a TLS configuration available the stream is TLS-wrapped.
    pub(crate) async fn open_data_connection(&mut self) -> Result<DataStream, TransferError> {
        let mut handler = self
            .transfer
            .take()
            .ok_or(TransferError::NoPendingHandler)?;
        let wait = self.ctx.settings.data_timeout;
        let opened = handler.open(wait).await;
        handler.close();
        let stream = opened?;

        if !self.protected_data {
            return Ok(Box::new(stream));
        }
        let config = match self.ctx.driver.tls_config() {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Session {}: PROT P without TLS configuration ({}), sending in clear",
                    self.info.id, e
                );
                return Ok(Box::new(stream));
            }
        };

        let tls = timeout(wait, TlsAcceptor::from(config).accept(stream))
            .await
            .map_err(|_| TransferError::Tls("handshake timed out".into()))?
            .map_err(|e| TransferError::Tls(e.to_string()))?;
        Ok(Box::new(tls))
    }
}
