use anyhow::{Context, Result};
use clap::Parser;
use driverftpd::config::{log_config, Config};
use driverftpd::constants::DEFAULT_CONFIG_PATH;
use driverftpd::core_cli::{parse_listen_override, Cli};
use driverftpd::{LocalDriver, Server};
use env_logger::{Builder, Env};
use log::info;
use std::io::Write;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    // Initialize the logger with a custom format
    let default_filter = if args.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp();
            writeln!(
                buf,
                "[{}] [{}] {}",
                timestamp,
                record.level(),
                record.args()
            )
        })
        .init();

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = Config::load_from_file(&config_path)?;

    if let Some(listen) = &args.listen {
        let (host, port) = parse_listen_override(listen)
            .with_context(|| format!("Invalid --listen address: {}", listen))?;
        config.server.listen_host = host;
        config.server.listen_port = port;
    }

    info!("Loaded configuration from {}", config_path.display());
    log_config(&config);

    let driver = LocalDriver::from_config(&config)?;
    let server = Server::new(driver).context("Failed to build server")?;

    tokio::select! {
        result = server.listen() => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    Ok(())
}
