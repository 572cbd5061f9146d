use crate::core_driver::Driver;
use crate::session::{Session, SessionError};
use log::{info, warn};

/// Handles the AUTH command (RFC 4217).
///
/// Asks the driver for a TLS configuration, answers 234 on the plain connection and
/// then runs the TLS handshake over it. Every later reply goes through TLS. A failed
/// handshake ends the session since the connection state is unknown by then.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The security mechanism; `TLS`, `TLS-C` and `SSL` are accepted.
///
/// # Returns
///
/// Result<(), SessionError>; `SessionError::Tls` when the handshake fails.
pub async fn handle_auth_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    let mechanism = arg.trim().to_ascii_uppercase();
    info!("Received AUTH command with argument: {}", mechanism);

    if !matches!(mechanism.as_str(), "TLS" | "TLS-C" | "SSL") {
        return session.reply(504, "AUTH mechanism not supported.").await;
    }
    if session.is_tls() {
        return session.reply(503, "TLS already active.").await;
    }

    let config = match session.ctx.driver.tls_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("Session {}: AUTH {} refused: {}", session.info.id, mechanism, e);
            return session.send_response(e.to_ftp_response().as_bytes()).await;
        }
    };

    session.reply(234, "AUTH command OK. Initializing TLS connection.").await?;
    session.start_tls(config).await
}

/// Handles PBSZ. Stream transfers over TLS have no buffer size to negotiate.
pub async fn handle_pbsz_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    session.reply(200, "PBSZ=0").await
}

/// Handles PROT: `P` protects data connections, anything else leaves them clear.
pub async fn handle_prot_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    let private = arg.trim().eq_ignore_ascii_case("P");
    session.protected_data = private;
    info!(
        "Session {}: data channel protection {}",
        session.info.id,
        if private { "private" } else { "clear" }
    );
    let msg = format!("Protection level set to {}.", if private { "P" } else { "C" });
    session.reply(200, &msg).await
}
