use crate::core_driver::Driver;
use crate::session::{AuthState, Session, SessionError};
use log::{info, warn};
use std::mem;

/// Handles the PASS command.
///
/// Hands the pending user name and the password to the driver. A rejected login
/// is answered with 530 and ends the session.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The password. Never logged.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_pass_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    let user = match mem::replace(&mut session.auth, AuthState::Unauthenticated) {
        AuthState::PendingPassword(user) => user,
        AuthState::Unauthenticated => {
            return session.reply(503, "Login with USER first.").await;
        }
        authenticated @ AuthState::Authenticated { .. } => {
            session.auth = authenticated;
            return session.reply(503, "Already logged in.").await;
        }
    };

    let result = session
        .ctx
        .driver
        .auth_user(&session.info, &user, &arg)
        .await;

    match result {
        Ok(handle) => {
            info!("Session {}: user {} logged in", session.info.id, user);
            session
                .ctx
                .registry
                .set_username(session.info.id, Some(user.clone()));
            session.auth = AuthState::Authenticated { user, handle };
            session.reply(230, "User logged in, proceed.").await
        }
        Err(e) => {
            warn!(
                "Session {}: authentication failed for user {}: {}",
                session.info.id, user, e
            );
            session.reply(530, "Login incorrect.").await?;
            session.close();
            Ok(())
        }
    }
}
