use crate::core_driver::Driver;
use crate::session::{Session, SessionError};
use log::info;

/// Builds the 211 FEAT reply. The TLS verbs only appear when TLS can actually be negotiated.
pub fn feature_reply(tls_available: bool) -> String {
    let mut features = vec!["UTF8", "SIZE", "MDTM", "EPSV", "EPRT", "PASV"];
    if tls_available {
        features.extend(["AUTH TLS", "PBSZ", "PROT"]);
    }

    let mut reply = String::from("211-Features:\r\n");
    for feature in features {
        reply.push(' ');
        reply.push_str(feature);
        reply.push_str("\r\n");
    }
    reply.push_str("211 End\r\n");
    reply
}

/// Handles the FEAT command (RFC 2389).
pub async fn handle_feat_command<D: Driver>(
    session: &mut Session<D>,
    _arg: String,
) -> Result<(), SessionError> {
    info!("Received FEAT command");
    let tls_available = session.ctx.driver.tls_config().is_ok();
    session
        .send_response(feature_reply(tls_available).as_bytes())
        .await
}

/// Handles OPTS. Only `UTF8 ON` is recognised; paths are UTF-8 already.
pub async fn handle_opts_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    let option = arg.split_whitespace().collect::<Vec<_>>().join(" ");
    if option.eq_ignore_ascii_case("UTF8 ON") || option.eq_ignore_ascii_case("UTF8") {
        session.reply(200, "Always in UTF8 mode.").await
    } else {
        let msg = format!("Option not understood: {}", option);
        session.reply(501, &msg).await
    }
}
