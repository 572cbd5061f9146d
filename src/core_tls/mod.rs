// SSL/TLS support: AUTH TLS on the control channel, PROT P on the data channel

pub mod error;
pub mod tls_config;

pub use error::TlsError;
pub use tls_config::TlsConfig;
