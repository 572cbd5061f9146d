use crate::core_driver::{Driver, SessionInfo};
use crate::server::ServerContext;
use crate::session::{Session, SessionError};
use chrono::Local;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

/// Accepts control connections forever, one task per connection.
pub async fn start_server<D: Driver>(
    listener: TcpListener,
    ctx: Arc<ServerContext<D>>,
) -> io::Result<()> {
    info!("Server listening on {}", listener.local_addr()?);

    loop {
        let (socket, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                // Usually descriptor exhaustion; back off instead of spinning.
                error!("Failed to accept connection: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
        };
        info!("New connection from {}", addr);

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            handle_connection(socket, addr, ctx).await;
            info!("Connection closed for {}", addr);
        });
    }
}

/// Registers the connection, runs its session to completion and unregisters it.
pub async fn handle_connection<D: Driver>(
    mut socket: TcpStream,
    peer_addr: SocketAddr,
    ctx: Arc<ServerContext<D>>,
) {
    let local_addr = match socket.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Dropping connection from {}: {}", peer_addr, e);
            return;
        }
    };

    let info = SessionInfo {
        id: ctx.registry.next_id(),
        peer_addr,
        local_addr,
        connected_at: Local::now(),
    };
    let id = info.id;

    if !ctx.registry.arrive(info.clone()) {
        warn!(
            "Refusing connection from {}: {} sessions already open",
            peer_addr, ctx.settings.max_connections
        );
        let _ = socket
            .write_all(b"421 Too many connections, try again later.\r\n")
            .await;
        let _ = socket.shutdown().await;
        return;
    }

    let _departure = ctx.registry.depart_on_drop(id);
    match Session::new(Arc::clone(&ctx), socket, info).run().await {
        Ok(()) => {}
        Err(SessionError::IdleTimeout) => info!("Session {} timed out", id),
        Err(e) => warn!("Session {} ended with error: {}", id, e),
    }
}
