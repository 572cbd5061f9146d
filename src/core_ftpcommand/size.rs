use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{info, warn};

/// Handles the SIZE command (RFC 3659). Directories have no size.
pub async fn handle_size_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received SIZE command with argument: {}", arg);

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.file_info(handle, &path).await;

    match result {
        Ok(info) if info.is_dir => {
            let msg = format!("{}: not a regular file.", path);
            session.reply(550, &msg).await
        }
        Ok(info) => session.reply(213, &info.size.to_string()).await,
        Err(e) => {
            warn!("SIZE failed for {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
