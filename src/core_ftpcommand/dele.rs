use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{error, info};

pub async fn handle_dele_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received DELE command with argument: {}", arg);
    if arg.trim().is_empty() {
        return session.reply(501, "Syntax error: DELE needs a file name.").await;
    }

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.delete_file(handle, &path).await;

    match result {
        Ok(()) => session.reply(250, "File deleted.").await,
        Err(e) => {
            error!("Failed to delete file {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
