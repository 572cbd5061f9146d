// TLS configuration: certificate and key loading for AUTH TLS / PROT P
use crate::core_tls::error::TlsError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_rustls::rustls;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Enables AUTH TLS on the control channel.
    pub enabled: bool,

    /// PEM certificate chain.
    pub cert_file: PathBuf,

    /// PEM PKCS#8 private key.
    pub key_file: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cert_file: PathBuf::from("etc/ssl/cert.pem"),
            key_file: PathBuf::from("etc/ssl/key.pem"),
        }
    }
}

impl TlsConfig {
    /// Checks that the certificate and key files exist when TLS is enabled.
    pub fn validate(&self) -> Result<(), TlsError> {
        if self.enabled {
            if !self.cert_file.exists() {
                return Err(TlsError::CertificateLoadError(format!(
                    "Certificate file not found: {:?}",
                    self.cert_file
                )));
            }

            if !self.key_file.exists() {
                return Err(TlsError::PrivateKeyLoadError(format!(
                    "Private key file not found: {:?}",
                    self.key_file
                )));
            }
        }

        Ok(())
    }

    /// Builds the rustls server configuration shared by every TLS handshake.
    pub fn load_server_config(&self) -> Result<Arc<rustls::ServerConfig>, TlsError> {
        if !self.enabled {
            return Err(TlsError::TlsNotConfigured);
        }
        self.validate()?;

        let certs = std::fs::read(&self.cert_file)
            .map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
        let key = std::fs::read(&self.key_file)
            .map_err(|e| TlsError::PrivateKeyLoadError(e.to_string()))?;

        let cert_chain = rustls_pemfile::certs(&mut BufReader::new(&certs[..]))
            .map_err(|e| TlsError::CertificateLoadError(e.to_string()))?;
        if cert_chain.is_empty() {
            return Err(TlsError::CertificateLoadError(format!(
                "No certificate found in {:?}",
                self.cert_file
            )));
        }

        let mut keys = rustls_pemfile::pkcs8_private_keys(&mut BufReader::new(&key[..]))
            .map_err(|e| TlsError::PrivateKeyLoadError(e.to_string()))?;
        let private_key = keys
            .pop()
            .ok_or_else(|| TlsError::PrivateKeyLoadError("No private key found".to_string()))?;

        let cert_chain: Vec<rustls::Certificate> =
            cert_chain.into_iter().map(rustls::Certificate).collect();

        let config = rustls::ServerConfig::builder()
            .with_safe_defaults()
            .with_no_client_auth()
            .with_single_cert(cert_chain, rustls::PrivateKey(private_key))
            .map_err(|e| TlsError::TlsConfigError(e.to_string()))?;

        debug!("TLS server configuration loaded from {:?}", self.cert_file);
        Ok(Arc::new(config))
    }
}
