use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};

/// Handles the RNTO (Rename To) command.
///
/// Renames the path recorded by RNFR. The pending source is cleared only when the
/// rename succeeds; after a failure the client may retry RNTO with another target.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The new name.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_rnto_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received RNTO command with argument: {}", arg);

    let Some(from) = session.rename_from.clone() else {
        return session.reply(550, "RNFR required first.").await;
    };
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: RNTO needs a path.").await;
    }

    let to = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.rename_file(handle, &from, &to).await;

    match result {
        Ok(()) => {
            info!("Renamed {} to {}", from, to);
            session.rename_from = None;
            session.reply(250, "Rename successful.").await
        }
        Err(e) => {
            error!("Failed to rename {} to {}: {}", from, to, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
