use crate::constants::USERNAME_REGEX;
use regex::Regex;
use std::sync::OnceLock;

fn username_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(USERNAME_REGEX).ok()).as_ref()
}

pub fn is_valid_username(username: &str) -> bool {
    username_regex().map_or(false, |re| re.is_match(username))
}

/// One `user:bcrypt-hash` line of the passwd file.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (username, hashed_password) = line.split_once(':')?;
        if !is_valid_username(username) || hashed_password.is_empty() {
            return None;
        }

        Some(PasswdEntry {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        })
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}
