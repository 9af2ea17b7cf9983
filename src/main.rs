//! pircd entry point: parse arguments, hook signals, run the server.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pircd::config::Config;
use pircd::server::Server;
use pircd::signals;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    signals::install().context("failed to install signal handlers")?;

    let config = Config::from_args(std::env::args().skip(1)).map_err(|e| {
        error!(error = %e, "invalid invocation");
        anyhow::Error::new(e)
    })?;

    info!(port = config.port, host = %config.host, "starting pircd");

    let mut server = Server::bind(config)?;
    server.run()?;

    info!("pircd stopped");
    Ok(())
}
