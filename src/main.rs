//! framed-echo: a blocking echo server built on a small transport core
//!
//! The core pieces:
//! - Length-framed message exchange over blocking sockets with
//!   retry-on-interrupt delivery
//! - Listener construction with a configurable address-reuse policy
//! - Bounded, non-blocking draining of pending connections
//! - Sliding-window percentile tracking of the live connection depth
//!
//! Configuration via CLI arguments or TOML file.

mod codec;
mod config;
mod net;
mod percentile;
mod server;

use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        reuse_port = config.reuse_port,
        accept_batch = config.accept_batch,
        timeout_secs = config.timeout_secs,
        stat_window = config.stat_window,
        cpus = net::num_cpus(),
        "Starting framed-echo server"
    );

    let mut server = server::Server::new(config);
    server.run()?;
    Ok(())
}
