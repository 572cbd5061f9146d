use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};

/// Handles the RMD (Remove Directory) command.
pub async fn handle_rmd_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received RMD command with argument: {}", arg);
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: RMD needs a directory name.").await;
    }

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.remove_directory(handle, &path).await;

    match result {
        Ok(()) => session.reply(250, "Directory removed.").await,
        Err(e) => {
            error!("Failed to remove directory {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
