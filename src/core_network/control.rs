use crate::core_tls::TlsError;
use std::io;
use std::mem;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;
use tokio_rustls::TlsAcceptor;

/// The control connection, upgraded in place by AUTH TLS.
pub enum ControlChannel {
    Plain(BufReader<TcpStream>),
    Tls(Box<BufReader<TlsStream<TcpStream>>>),
    /// Left behind by a failed upgrade. Every operation on it fails.
    Upgrading,
}

fn upgrade_failed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "control connection lost during TLS upgrade")
}

/// Consumes input up to and including the next `\n`, or to EOF.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

impl ControlChannel {
    pub fn new(stream: TcpStream) -> Self {
        ControlChannel::Plain(BufReader::new(stream))
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, ControlChannel::Tls(_))
    }

    /// Reads one line into `buf`, at most `limit` bytes. Returns 0 on EOF.
    pub async fn read_line(&mut self, buf: &mut Vec<u8>, limit: u64) -> io::Result<usize> {
        match self {
            ControlChannel::Plain(reader) => reader.take(limit).read_until(b'\n', buf).await,
            ControlChannel::Tls(reader) => {
                reader.as_mut().take(limit).read_until(b'\n', buf).await
            }
            ControlChannel::Upgrading => Err(upgrade_failed()),
        }
    }

    /// Drops the remainder of the current line.
    pub async fn discard_line(&mut self) -> io::Result<()> {
        match self {
            ControlChannel::Plain(reader) => skip_line(reader).await,
            ControlChannel::Tls(reader) => skip_line(reader.as_mut()).await,
            ControlChannel::Upgrading => Err(upgrade_failed()),
        }
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            ControlChannel::Plain(reader) => {
                let stream = reader.get_mut();
                stream.write_all(bytes).await?;
                stream.flush().await
            }
            ControlChannel::Tls(reader) => {
                let stream = reader.get_mut();
                stream.write_all(bytes).await?;
                stream.flush().await
            }
            ControlChannel::Upgrading => Err(upgrade_failed()),
        }
    }

    /// Runs the server side of the TLS handshake over the existing connection.
    ///
    /// Anything the client pipelined behind AUTH before the handshake is discarded.
    pub async fn upgrade(&mut self, acceptor: TlsAcceptor) -> Result<(), TlsError> {
        let stream = match mem::replace(self, ControlChannel::Upgrading) {
            ControlChannel::Plain(reader) => reader.into_inner(),
            other => {
                *self = other;
                return Err(TlsError::TlsConfigError(
                    "control connection is already protected".into(),
                ));
            }
        };

        let tls = acceptor
            .accept(stream)
            .await
            .map_err(|e| TlsError::TlsHandshakeError(e.to_string()))?;
        *self = ControlChannel::Tls(Box::new(BufReader::new(tls)));
        Ok(())
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            ControlChannel::Plain(reader) => reader.get_mut().shutdown().await,
            ControlChannel::Tls(reader) => reader.get_mut().shutdown().await,
            ControlChannel::Upgrading => Ok(()),
        }
    }
}
