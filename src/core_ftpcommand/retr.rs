use crate::constants::TRANSFER_BUFFER_SIZE;
use crate::core_driver::{Driver, OpenMode};
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::TransferError;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};
use tokio::io::{AsyncWriteExt, BufReader};

/// Handles the RETR (Retrieve) command.
///
/// The file is opened through the driver before 150 is sent, so a missing file is
/// reported without touching the data connection (the pending handler is dropped).
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The file to send.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when a control reply cannot be written.
pub async fn handle_retr_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received RETR command with argument: {}", arg);
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: RETR needs a file name.").await;
    }
    if session.transfer.is_none() {
        let msg = TransferError::NoPendingHandler.to_ftp_response();
        return session.send_response(msg.as_bytes()).await;
    }

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let opened = driver.open_file(handle, &path, OpenMode::ReadOnly).await;

    let file = match opened {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {} for reading: {}", path, e);
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

    let mut data = match session.open_data_connection().await {
        Ok(data) => data,
        Err(e) => return session.send_response(e.to_ftp_response().as_bytes()).await,
    };

    let mut reader = BufReader::with_capacity(TRANSFER_BUFFER_SIZE, file);
    let copied = async {
        let bytes = tokio::io::copy_buf(&mut reader, &mut data).await?;
        data.shutdown().await?;
        Ok::<u64, std::io::Error>(bytes)
    }
    .await;

    match copied {
        Ok(bytes) => {
            info!("Session {}: sent {} bytes of {}", session.info.id, bytes, path);
            session.reply(226, "Transfer complete.").await
        }
        Err(e) => {
            error!("Transfer of {} failed: {}", path, e);
            let msg = format!("Transfer failed: {}", e);
            session.reply(550, &msg).await
        }
    }
}
