use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::core_driver::{Driver, OpenMode};
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::TransferError;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};
use tokio::io::{AsyncWriteExt, BufReader};

/// Handles the STOR (Store) command: create or truncate, then receive.
pub async fn handle_stor_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received STOR command with argument: {}", arg);
    receive_file(session, &arg, OpenMode::WriteCreateTruncate).await
}

/// Handles the APPE (Append) command: like STOR but keeps existing content.
pub async fn handle_appe_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received APPE command with argument: {}", arg);
    receive_file(session, &arg, OpenMode::WriteAppend).await
}

async fn receive_file<D: Driver>(
    session: &mut Session<D>,
    arg: &str,
    mode: OpenMode,
) -> Result<(), SessionError> {
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: a file name is required.").await;
    }
    if session.transfer.is_none() {
        let msg = TransferError::NoPendingHandler.to_ftp_response();
        return session.send_response(msg.as_bytes()).await;
    }

    let path = resolve_path(&session.current_dir, arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let opened = driver.open_file(handle, &path, mode).await;

    let mut file = match opened {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {} for writing: {}", path, e);
            session.discard_transfer();
            return session.send_response(e.to_ftp_response().as_bytes()).await;
        }
    };

    let msg = format!(
        "Opening {} mode data connection for {}.",
        session.transfer_type.as_str(),
        path
    );
    session.reply(150, &msg).await?;

    let data = match session.open_data_connection().await {
        Ok(data) => data,
        Err(e) => return session.send_response(e.to_ftp_response().as_bytes()).await,
    };

    let mut reader = BufReader::with_capacity(TRANSFER_BUFFER_SIZE, data);
    let copied = async {
        let bytes = tokio::io::copy_buf(&mut reader, &mut file).await?;
        // Buffered writes must reach the driver before 226 goes out.
        file.shutdown().await?;
        Ok::<u64, std::io::Error>(bytes)
    }
    .await;

    match copied {
        Ok(bytes) => {
            info!(
                "Session {}: received {} bytes into {}",
                session.info.id, bytes, path
            );
            session.reply(226, "Transfer complete.").await
        }
        Err(e) => {
            error!("Upload to {} failed: {}", path, e);
            let msg = format!("Transfer failed: {}", e);
            session.reply(550, &msg).await
        }
    }
}
