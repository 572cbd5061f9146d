use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{info, warn};

/// Handles the RNFR (Rename From) command.
///
/// Remembers the source path for the following RNTO once the driver confirms it exists.
/// A source that does not exist clears any earlier pending rename.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The current name of the file or directory.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_rnfr_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received RNFR command with argument: {}", arg);
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: RNFR needs a path.").await;
    }

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.file_info(handle, &path).await;

    match result {
        Ok(_) => {
            session.rename_from = Some(path);
            session.reply(350, "Ready for RNTO.").await
        }
        Err(e) => {
            warn!("RNFR source {} rejected: {}", path, e);
            session.rename_from = None;
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
