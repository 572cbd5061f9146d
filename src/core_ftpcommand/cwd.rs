use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{info, warn};

/// Handles the CWD command.
///
/// The target is resolved against the working directory and checked by the driver;
/// the working directory only changes when the driver accepts it.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - Directory to change to, absolute or relative.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_cwd_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received CWD command with argument: {}", arg);
    change_directory(session, &arg).await
}

/// Handles CDUP (and XCUP): CWD to the parent directory.
pub async fn handle_cdup_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    change_directory(session, "..").await
}

async fn change_directory<D: Driver>(session: &mut Session<D>, arg: &str) -> Result<(), SessionError> {
    let path = resolve_path(&session.current_dir, arg);

    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.change_directory(handle, &path).await;

    match result {
        Ok(()) => {
            info!("Session {}: working directory is now {}", session.info.id, path);
            session.current_dir = path;
            session.reply(250, "Directory successfully changed.").await
        }
        Err(e) => {
            warn!("Failed to change directory to {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
