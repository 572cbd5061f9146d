use crate::core_driver::Driver;
use crate::core_ftpcommand::utils::resolve_path;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use chrono::{DateTime, Utc};
use log::{info, warn};

/// `YYYYMMDDHHMMSS` in UTC, as MDTM expects.
pub fn format_mdtm(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d%H%M%S").to_string()
}

/// Handles the MDTM command (RFC 3659).
pub async fn handle_mdtm_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received MDTM command with argument: {}", arg);

    let path = resolve_path(&session.current_dir, &arg);
    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.file_info(handle, &path).await;

    match result {
        Ok(info) => session.reply(213, &format_mdtm(&info.mod_time)).await,
        Err(e) => {
            warn!("MDTM failed for {}: {}", path, e);
            session.send_response(e.to_ftp_response().as_bytes()).await
        }
    }
}
