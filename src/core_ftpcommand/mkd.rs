use crate::core_driver::Driver;
use crate::core_ftpcommand::pwd::quote_path;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};

/// Handles the MKD (Make Directory) command.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The directory to create, absolute or relative to the working directory.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_mkd_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received MKD command with argument: {}", arg);
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: MKD needs a directory name.").await;
    }

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.make_directory(handle, &path).await;

    match result {
        Ok(()) => {
            info!("Directory created successfully: {}", path);
            let msg = format!("{} directory created.", quote_path(&path));
            session.reply(250, &msg).await
        }
        Err(e) => {
            error!("Failed to create directory {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
