use crate::core_driver::{Driver, DriverError, Settings};
use crate::core_ftpcommand::handlers::{initialize_command_handlers, CommandTable};
use crate::core_network::network;
use crate::core_network::{ServerStats, SessionEntry, SessionRegistry};
use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Everything the sessions of one server share.
pub struct ServerContext<D: Driver> {
    pub driver: Arc<D>,
    /// Read once from the driver when the server is built.
    pub settings: Settings,
    pub registry: SessionRegistry,
    pub commands: CommandTable<D>,
}

/// An FTP server over a storage driver.
///
/// Cloning is cheap and every clone serves and reports on the same sessions.
pub struct Server<D: Driver> {
    ctx: Arc<ServerContext<D>>,
}

impl<D: Driver> Clone for Server<D> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
        }
    }
}

impl<D: Driver> Server<D> {
    /// Builds the server. Fails when the driver cannot produce its settings.
    pub fn new(driver: D) -> Result<Self, DriverError> {
        let settings = driver.settings()?;
        let registry = SessionRegistry::new(settings.max_connections);
        Ok(Self {
            ctx: Arc::new(ServerContext {
                driver: Arc::new(driver),
                settings,
                registry,
                commands: initialize_command_handlers(),
            }),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    pub fn driver(&self) -> &D {
        &self.ctx.driver
    }

    /// Binds the configured listen address and serves it.
    pub async fn listen(&self) -> Result<()> {
        let settings = &self.ctx.settings;
        let listener = TcpListener::bind((settings.listen_host.as_str(), settings.listen_port))
            .await
            .with_context(|| format!("Failed to bind {}", settings.listen_address()))?;
        self.serve(listener).await
    }

    /// Serves an already bound listener, e.g. one handed over by a supervisor.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        info!(
            "Starting server (max connections: {}, idle timeout: {:?})",
            self.ctx.settings.max_connections, self.ctx.settings.idle_timeout
        );
        network::start_server(listener, Arc::clone(&self.ctx))
            .await
            .context("Server stopped accepting connections")
    }

    /// Snapshot of the live sessions, ordered by id.
    pub fn sessions(&self) -> Vec<SessionEntry> {
        self.ctx.registry.snapshot()
    }

    pub fn stats(&self) -> ServerStats {
        self.ctx.registry.stats()
    }
}
