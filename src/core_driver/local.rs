//! Local-disk driver: a root directory plus a bcrypt passwd file.

use crate::config::Config;
use crate::core_auth::{load_passwd_file, verify_password, PasswdEntry};
use crate::core_driver::{
    Driver, DriverError, DriverFile, FileInfo, OpenMode, SessionInfo, Settings,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_rustls::rustls;

const DEFAULT_WELCOME: &str = "Welcome to driverftpd.";

/// Handle of a user logged in through [`LocalDriver`].
#[derive(Debug, Clone)]
pub struct LocalUser {
    pub username: String,
}

pub struct LocalDriver {
    root: PathBuf,
    users: HashMap<String, PasswdEntry>,
    settings: Settings,
    banner: Option<String>,
    tls: Option<Arc<rustls::ServerConfig>>,
}

impl LocalDriver {
    /// Creates a driver rooted at `root`, which must exist.
    pub fn new(
        root: impl AsRef<Path>,
        users: HashMap<String, PasswdEntry>,
        settings: Settings,
    ) -> std::io::Result<Self> {
        let root = root.as_ref().canonicalize()?;
        Ok(Self {
            root,
            users,
            settings,
            banner: None,
            tls: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = config.settings()?;
        let users = load_passwd_file(&config.server.passwd_file)?;
        let mut driver = Self::new(&config.server.root_dir, users, settings).with_context(|| {
            format!(
                "Failed to open root directory: {}",
                config.server.root_dir.display()
            )
        })?;

        if let Some(banner_path) = &config.server.banner {
            let banner = std::fs::read_to_string(banner_path).with_context(|| {
                format!("Failed to read banner file: {}", banner_path.display())
            })?;
            driver = driver.with_banner(banner);
        }

        if config.tls.enabled {
            driver = driver.with_tls(config.tls.load_server_config()?);
        }

        Ok(driver)
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn with_tls(mut self, tls: Arc<rustls::ServerConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a normalised virtual path beneath the root, refusing anything that escapes it.
    fn real_path(&self, path: &str) -> Result<PathBuf, DriverError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(DriverError::PermissionDenied(path.to_string()));
        }
        let full = self.root.join(relative);

        // Symlinks may still point outside the root.
        let resolved = match full.canonicalize() {
            Ok(resolved) => resolved,
            Err(_) => match (full.parent().map(Path::canonicalize), full.file_name()) {
                (Some(Ok(parent)), Some(name)) => parent.join(name),
                _ => full.clone(),
            },
        };
        if !resolved.starts_with(&self.root) {
            warn!("Path is outside of the allowed area: {:?}", resolved);
            return Err(DriverError::PermissionDenied(path.to_string()));
        }

        Ok(full)
    }
}

fn file_info(name: String, metadata: &Metadata) -> FileInfo {
    let mod_time = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    FileInfo {
        name,
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        is_dir: metadata.is_dir(),
        mod_time,
        mode: unix_mode(metadata),
    }
}

#[cfg(unix)]
fn unix_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn unix_mode(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

fn base_name(path: &str) -> String {
    path.rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or("/")
        .to_string()
}

#[async_trait]
impl Driver for LocalDriver {
    type Handle = LocalUser;

    fn settings(&self) -> Result<Settings, DriverError> {
        Ok(self.settings.clone())
    }

    async fn welcome_user(&self, session: &SessionInfo) -> Result<String, DriverError> {
        debug!("Welcoming session {} from {}", session.id, session.peer_addr);
        Ok(self
            .banner
            .clone()
            .unwrap_or_else(|| DEFAULT_WELCOME.to_string()))
    }

    async fn auth_user(
        &self,
        session: &SessionInfo,
        user: &str,
        pass: &str,
    ) -> Result<LocalUser, DriverError> {
        let entry = match self.users.get(user) {
            Some(entry) => entry.clone(),
            None => {
                warn!("Session {}: unknown user {}", session.id, user);
                return Err(DriverError::AuthenticationFailed(user.to_string()));
            }
        };

        let pass = pass.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            verify_password(&pass, entry.get_hashed_password())
        })
        .await
        .map_err(|e| DriverError::Other(e.to_string()))?;

        if verified {
            info!("Session {}: user {} authenticated", session.id, user);
            Ok(LocalUser {
                username: user.to_string(),
            })
        } else {
            warn!("Session {}: bad password for user {}", session.id, user);
            Err(DriverError::AuthenticationFailed(user.to_string()))
        }
    }

    async fn change_directory(&self, _handle: &LocalUser, path: &str) -> Result<(), DriverError> {
        let real = self.real_path(path)?;
        let metadata = fs::metadata(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(DriverError::NotFound(path.to_string()))
        }
    }

    async fn make_directory(&self, _handle: &LocalUser, path: &str) -> Result<(), DriverError> {
        let real = self.real_path(path)?;
        fs::create_dir(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))
    }

    async fn remove_directory(&self, _handle: &LocalUser, path: &str) -> Result<(), DriverError> {
        let real = self.real_path(path)?;
        if real == self.root {
            return Err(DriverError::PermissionDenied(path.to_string()));
        }
        fs::remove_dir(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))
    }

    async fn delete_file(&self, _handle: &LocalUser, path: &str) -> Result<(), DriverError> {
        let real = self.real_path(path)?;
        let metadata = fs::metadata(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        if metadata.is_dir() {
            return Err(DriverError::Other(format!("{} is a directory", path)));
        }
        fs::remove_file(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))
    }

    async fn rename_file(&self, _handle: &LocalUser, from: &str, to: &str) -> Result<(), DriverError> {
        let real_from = self.real_path(from)?;
        let real_to = self.real_path(to)?;
        fs::rename(&real_from, &real_to)
            .await
            .map_err(|e| DriverError::from_io(e, from))
    }

    async fn list_files(&self, _handle: &LocalUser, path: &str) -> Result<Vec<FileInfo>, DriverError> {
        let real = self.real_path(path)?;
        let metadata = fs::metadata(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        if !metadata.is_dir() {
            return Ok(vec![file_info(base_name(path), &metadata)]);
        }

        let mut entries = fs::read_dir(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DriverError::from_io(e, path))?
        {
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(
                        "Failed to get metadata for entry: {:?}, error: {:?}",
                        entry.path(),
                        e
                    );
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(file_info(name, &metadata));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn open_file(
        &self,
        _handle: &LocalUser,
        path: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn DriverFile>, DriverError> {
        let real = self.real_path(path)?;
        let mut options = fs::OpenOptions::new();
        match mode {
            OpenMode::ReadOnly => {
                let metadata = fs::metadata(&real)
                    .await
                    .map_err(|e| DriverError::from_io(e, path))?;
                if metadata.is_dir() {
                    return Err(DriverError::Other(format!("{} is a directory", path)));
                }
                options.read(true);
            }
            OpenMode::WriteCreateTruncate => {
                options.write(true).create(true).truncate(true);
            }
            OpenMode::WriteAppend => {
                options.append(true).create(true);
            }
        }

        let file = options
            .open(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        Ok(Box::new(file))
    }

    async fn file_info(&self, _handle: &LocalUser, path: &str) -> Result<FileInfo, DriverError> {
        let real = self.real_path(path)?;
        let metadata = fs::metadata(&real)
            .await
            .map_err(|e| DriverError::from_io(e, path))?;
        Ok(file_info(base_name(path), &metadata))
    }

    fn tls_config(&self) -> Result<Arc<rustls::ServerConfig>, DriverError> {
        self.tls.clone().ok_or(DriverError::NoTlsAvailable)
    }

    async fn user_left(&self, session: &SessionInfo) {
        debug!("Session {} left", session.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn driver(dir: &Path) -> LocalDriver {
        LocalDriver::new(dir, HashMap::new(), Settings::default()).unwrap()
    }

    fn user() -> LocalUser {
        LocalUser {
            username: "alice".into(),
        }
    }

    #[test]
    fn real_path_stays_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        assert_eq!(driver.real_path("/").unwrap(), driver.root().to_path_buf());
        assert_eq!(
            driver.real_path("/a/b.txt").unwrap(),
            driver.root().join("a/b.txt")
        );
        assert!(driver.real_path("/../etc/passwd").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("/", dir.path().join("escape")).unwrap();
        let driver = driver(dir.path());
        assert!(matches!(
            driver.real_path("/escape/etc"),
            Err(DriverError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn write_append_read_and_info() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        let handle = user();

        let mut file = driver
            .open_file(&handle, "/f.txt", OpenMode::WriteCreateTruncate)
            .await
            .unwrap();
        file.write_all(b"hello").await.unwrap();
        file.shutdown().await.unwrap();
        drop(file);

        let mut file = driver
            .open_file(&handle, "/f.txt", OpenMode::WriteAppend)
            .await
            .unwrap();
        file.write_all(b" world").await.unwrap();
        file.shutdown().await.unwrap();
        drop(file);

        let mut file = driver
            .open_file(&handle, "/f.txt", OpenMode::ReadOnly)
            .await
            .unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "hello world");

        let info = driver.file_info(&handle, "/f.txt").await.unwrap();
        assert_eq!(info.name, "f.txt");
        assert_eq!(info.size, 11);
        assert!(!info.is_dir);
    }

    #[tokio::test]
    async fn directory_operations() {
        let dir = tempfile::tempdir().unwrap();
        let driver = driver(dir.path());
        let handle = user();

        driver.make_directory(&handle, "/sub").await.unwrap();
        assert!(driver.make_directory(&handle, "/sub").await.is_err());
        driver.change_directory(&handle, "/sub").await.unwrap();
        assert!(matches!(
            driver.change_directory(&handle, "/missing").await,
            Err(DriverError::NotFound(_))
        ));

        let listing = driver.list_files(&handle, "/").await.unwrap();
        assert_eq!(listing.len(), 1);
        assert!(listing[0].is_dir);

        driver.remove_directory(&handle, "/sub").await.unwrap();
        assert!(driver.list_files(&handle, "/").await.unwrap().is_empty());
        assert!(driver.remove_directory(&handle, "/").await.is_err());
    }

    #[tokio::test]
    async fn authenticates_against_passwd_entries() {
        let dir = tempfile::tempdir().unwrap();
        let hashed = crate::core_auth::hash_password("secret", Some(4)).unwrap();
        let users = crate::core_auth::parse_passwd(&format!("alice:{}\n", hashed));
        let driver = LocalDriver::new(dir.path(), users, Settings::default()).unwrap();
        let session = SessionInfo {
            id: 1,
            peer_addr: "127.0.0.1:5000".parse().unwrap(),
            local_addr: "127.0.0.1:21".parse().unwrap(),
            connected_at: chrono::Local::now(),
        };

        let handle = driver.auth_user(&session, "alice", "secret").await.unwrap();
        assert_eq!(handle.username, "alice");
        assert!(driver.auth_user(&session, "alice", "nope").await.is_err());
        assert!(driver.auth_user(&session, "bob", "secret").await.is_err());
    }
}
