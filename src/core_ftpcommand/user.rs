use crate::core_driver::Driver;
use crate::session::{AuthState, Session, SessionError};
use log::info;

/// Handles the USER command.
///
/// Records the user name and waits for PASS. Nothing is checked yet, so the reply
/// is the same for known and unknown users.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The user name.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_user_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    let username = arg.trim();
    info!("Received USER command with argument: {}", username);

    if username.is_empty() {
        return session.reply(501, "Syntax error: USER needs a user name.").await;
    }
    if session.is_authenticated() {
        return session.reply(503, "Already logged in.").await;
    }

    session.auth = AuthState::PendingPassword(username.to_string());
    session.reply(331, "User name okay, need password.").await
}
