use crate::constants::SYSTEM_TYPE;
use crate::core_driver::Driver;
use crate::session::{Session, SessionError};
use log::info;

/// Handles the SYST (System) command.
pub async fn handle_syst_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    info!("Responding to SYST command with system type.");
    session.reply(215, SYSTEM_TYPE).await
}
