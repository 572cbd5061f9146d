//! An FTP protocol engine over pluggable storage drivers.
//!
//! [`Server`] accepts control connections and runs one [`session::Session`] per
//! connection; every storage and authentication decision goes through a
//! [`core_driver::Driver`].

pub mod config;
pub mod constants;
pub mod core_auth;
pub mod core_cli;
pub mod core_driver;
pub mod core_ftpcommand;
pub mod core_network;
pub mod core_tls;
pub mod server;
pub mod session;

pub use config::Config;
pub use core_driver::{Driver, DriverError, LocalDriver, Settings};
pub use server::Server;
