use crate::core_driver::Driver;
use crate::session::{Session, SessionError, TransferType};
use log::info;

/// Maps a TYPE argument to a transfer type. `None` for types that are not supported.
pub fn parse_type_arg(arg: &str) -> Option<TransferType> {
    let normalized = arg.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
    match normalized.as_str() {
        "A" | "A N" => Some(TransferType::Ascii),
        "I" | "L 8" | "L8" => Some(TransferType::Binary),
        _ => None,
    }
}

/// Handles the TYPE command.
///
/// Only the session flag changes; ASCII transfers are sent byte for byte.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - The representation type (`A`, `I`, `L 8`).
///
/// # Returns
///
/// Result<(), SessionError>; an error only when the reply cannot be written.
pub async fn handle_type_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received TYPE command with argument: {}", arg);
    match parse_type_arg(&arg) {
        Some(transfer_type) => {
            session.transfer_type = transfer_type;
            let msg = format!("Switching to {} mode.", transfer_type.as_str());
            session.reply(200, &msg).await
        }
        None => session.reply(504, "Type not supported.").await,
    }
}

pub async fn handle_mode_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    if arg.trim().eq_ignore_ascii_case("S") {
        session.reply(200, "Mode set to S.").await
    } else {
        session.reply(504, "Only stream mode is supported.").await
    }
}

pub async fn handle_stru_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    if arg.trim().eq_ignore_ascii_case("F") {
        session.reply(200, "Structure set to F.").await
    } else {
        session.reply(504, "Only file structure is supported.").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_arguments() {
        assert_eq!(parse_type_arg("A"), Some(TransferType::Ascii));
        assert_eq!(parse_type_arg("a  n"), Some(TransferType::Ascii));
        assert_eq!(parse_type_arg("I"), Some(TransferType::Binary));
        assert_eq!(parse_type_arg("L 8"), Some(TransferType::Binary));
        assert_eq!(parse_type_arg("E"), None);
        assert_eq!(parse_type_arg(""), None);
    }
}
