use crate::core_driver::Driver;
use crate::session::{Session, SessionError};

pub async fn handle_noop_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    session.reply(200, "NOOP ok.").await
}

/// ALLO: storage is never reserved up front.
pub async fn handle_allo_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    session.reply(202, "No storage allocation necessary.").await
}
