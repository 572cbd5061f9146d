use crate::core_driver::{Driver, FileInfo};
use crate::core_ftpcommand::utils::resolve_path;
use crate::core_network::TransferError;
use crate::session::{Session, SessionError, NOT_LOGGED_IN};
use log::{info, warn};
use tokio::io::AsyncWriteExt;

/// One `ls -l` style line.
pub fn format_list_line(info: &FileInfo) -> String {
    format!(
        "{} 1 owner group {:>12} {} {}\r\n",
        info.mode_string(),
        info.size,
        info.mod_time.format("%b %e %H:%M"),
        info.name
    )
}

/// Drops leading `ls` flags such as `-la` that many clients send with LIST.
fn list_target(arg: &str) -> &str {
    let mut rest = arg.trim();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    rest
}

/// Handles the LIST command.
///
/// Sends 150, waits for the pending data connection, writes the listing and a
/// closing blank line, then answers 226. The transfer handler is closed whatever
/// happens, so every LIST needs a fresh PASV or PORT.
///
/// # Arguments
///
/// * `session` - The session issuing the command.
/// * `arg` - Optional directory or file to list, possibly preceded by `ls` flags.
///
/// # Returns
///
/// Result<(), SessionError>; an error only when a control reply cannot be written.
pub async fn handle_list_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received LIST command with argument: {}", arg);
    send_listing(session, &arg, true).await
}

/// Handles the NLST command: bare names, one per line.
pub async fn handle_nlst_command<D: Driver>(
    session: &mut Session<D>,
    arg: String,
) -> Result<(), SessionError> {
    info!("Received NLST command with argument: {}", arg);
    send_listing(session, &arg, false).await
}

async fn send_listing<D: Driver>(
    session: &mut Session<D>,
    arg: &str,
    detailed: bool,
) -> Result<(), SessionError> {
    if session.transfer.is_none() {
        let msg = TransferError::NoPendingHandler.to_ftp_response();
        return session.send_response(msg.as_bytes()).await;
    }

    let path = resolve_path(&session.current_dir, list_target(arg));
    session.reply(150, "Here comes the directory listing.").await?;

    let mut data = match session.open_data_connection().await {
        Ok(data) => data,
        Err(e) => return session.send_response(e.to_ftp_response().as_bytes()).await,
    };

    let Some((driver, handle)) = session.driver_handle() else {
        return session.send_response(NOT_LOGGED_IN).await;
    };
    let result = driver.list_files(handle, &path).await;

    let files = match result {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list {}: {}", path, e);
            let _ = data.shutdown().await;
            return session.send_response(e.to_ftp_response().as_bytes()).await;
        }
    };

    let mut listing = String::new();
    for file in &files {
        if detailed {
            listing.push_str(&format_list_line(file));
        } else {
            listing.push_str(&file.name);
            listing.push_str("\r\n");
        }
    }
    if detailed {
        listing.push_str("\r\n");
    }

    let sent = async {
        data.write_all(listing.as_bytes()).await?;
        data.shutdown().await
    }
    .await;

    match sent {
        Ok(()) => {
            info!(
                "Session {}: listed {} entries of {}",
                session.info.id,
                files.len(),
                path
            );
            session.reply(226, "Directory send OK.").await
        }
        Err(e) => {
            warn!("Listing transfer for {} failed: {}", path, e);
            let msg = format!("Transfer failed: {}", e);
            session.reply(550, &msg).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn list_line_matches_ls_layout() {
        let info = FileInfo {
            name: "report.txt".into(),
            size: 1234,
            is_dir: false,
            mod_time: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap(),
            mode: 0o644,
        };
        assert_eq!(
            format_list_line(&info),
            "-rw-r--r-- 1 owner group         1234 Mar  9 07:05 report.txt\r\n"
        );
    }

    #[test]
    fn list_flags_are_ignored() {
        assert_eq!(list_target(""), "");
        assert_eq!(list_target("-la"), "");
        assert_eq!(list_target("-l -a sub dir"), "sub dir");
        assert_eq!(list_target("docs"), "docs");
    }
}
