use crate::core_auth::core_auth::PasswdEntry;
use anyhow::{Context, Result};
use bcrypt::{hash, verify, BcryptResult, DEFAULT_COST};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

/// Hashes a password for a passwd entry. `None` uses bcrypt's default cost.
pub fn hash_password(password: &str, cost: Option<u32>) -> BcryptResult<String> {
    hash(password, cost.unwrap_or(DEFAULT_COST))
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

/// Parses passwd file contents, skipping malformed lines.
pub fn parse_passwd(content: &str) -> HashMap<String, PasswdEntry> {
    let mut passwd_map = HashMap::new();

    for (lineno, line) in content.lines().enumerate() {
        match PasswdEntry::from_line(line) {
            Some(entry) => {
                passwd_map.insert(entry.get_username().to_string(), entry);
            }
            None if !line.trim().is_empty() && !line.trim_start().starts_with('#') => {
                warn!("Ignoring malformed passwd line {}", lineno + 1);
            }
            None => {}
        }
    }
    passwd_map
}

pub fn load_passwd_file(path: &Path) -> Result<HashMap<String, PasswdEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read passwd file: {}", path.display()))?;
    let passwd_map = parse_passwd(&content);
    info!("Loaded {} user(s) from {}", passwd_map.len(), path.display());
    Ok(passwd_map)
}
