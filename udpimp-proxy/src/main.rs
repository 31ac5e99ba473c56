#![forbid(unsafe_code)]

use clap::Parser;
use udpimp_proxy_lib::config::{validate, Cli, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config: Config = cli.into();

    if let Err(err) = validate(&config) {
        error!(%err, "invalid configuration");
        std::process::exit(1);
    }

    info!(
        client_port = config.client_port,
        server_port = config.server_port,
        observer_port = config.observer_port,
        "configuration loaded"
    );

    if let Err(err) = udpimp_proxy_lib::run(config).await {
        error!(%err, "proxy exited with error");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}
