use crate::core_driver::Driver;
use crate::session::{Session, SessionError};
use log::info;

/// Handles the QUIT command: says goodbye and ends the session.
pub async fn handle_quit_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    info!("Session {}: client sent QUIT", session.info.id);
    session.reply(221, "Goodbye.").await?;
    session.close();
    Ok(())
}
