use crate::core_driver::Driver;
use crate::session::{Session, SessionError};

/// Quotes a path for a 257 reply. Embedded quotes are doubled (RFC 959).
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

/// Handles the PWD command.
pub async fn handle_pwd_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    let msg = format!("{} is the current directory.", quote_path(&session.current_dir));
    session.reply(257, &msg).await
}
