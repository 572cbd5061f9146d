//! The storage and authentication boundary of the protocol engine.
//!
//! A [`Driver`] supplies authentication, directory and file operations, settings and
//! the TLS configuration. The protocol engine only ever talks to storage through it;
//! [`local::LocalDriver`] is the local-disk implementation used by the binary.

pub mod error;
pub mod local;
pub mod settings;

pub use error::DriverError;
pub use local::LocalDriver;
pub use settings::Settings;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::rustls;

/// Identifier assigned to a control connection when it is accepted.
pub type SessionId = u64;

/// What a driver gets to know about the session calling it.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
    pub connected_at: DateTime<Local>,
}

/// Metadata for one directory entry or file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub mod_time: DateTime<Utc>,
    /// Unix permission bits (`0o755`, ...).
    pub mode: u32,
}

impl FileInfo {
    /// `ls -l` style permission string, e.g. `drwxr-xr-x`.
    pub fn mode_string(&self) -> String {
        let mut out = String::with_capacity(10);
        out.push(if self.is_dir { 'd' } else { '-' });
        for shift in [6u32, 3, 0] {
            let bits = (self.mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    WriteCreateTruncate,
    WriteAppend,
}

/// Byte stream returned by [`Driver::open_file`].
pub trait DriverFile: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DriverFile for T {}

#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Opaque value produced by a successful login and passed to every later call.
    type Handle: Send + Sync + 'static;

    fn settings(&self) -> Result<Settings, DriverError>;

    /// Greeting sent as the 220 reply. An error aborts the session before login.
    async fn welcome_user(&self, session: &SessionInfo) -> Result<String, DriverError>;

    async fn auth_user(
        &self,
        session: &SessionInfo,
        user: &str,
        pass: &str,
    ) -> Result<Self::Handle, DriverError>;

    async fn change_directory(&self, handle: &Self::Handle, path: &str)
        -> Result<(), DriverError>;

    async fn make_directory(&self, handle: &Self::Handle, path: &str) -> Result<(), DriverError>;

    async fn remove_directory(&self, handle: &Self::Handle, path: &str)
        -> Result<(), DriverError>;

    async fn delete_file(&self, handle: &Self::Handle, path: &str) -> Result<(), DriverError>;

    async fn rename_file(
        &self,
        handle: &Self::Handle,
        from: &str,
        to: &str,
    ) -> Result<(), DriverError>;

    async fn list_files(&self, handle: &Self::Handle, path: &str)
        -> Result<Vec<FileInfo>, DriverError>;

    async fn open_file(
        &self,
        handle: &Self::Handle,
        path: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn DriverFile>, DriverError>;

    async fn file_info(&self, handle: &Self::Handle, path: &str) -> Result<FileInfo, DriverError>;

    fn tls_config(&self) -> Result<Arc<rustls::ServerConfig>, DriverError>;

    /// Called once when an authenticated session ends.
    async fn user_left(&self, _session: &SessionInfo) {}
}
