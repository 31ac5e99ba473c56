//! Startup configuration: a `clap` CLI surface plus the validated record
//! pipelines and the supervisor are actually built from.

mod cli;

pub use cli::Cli;

use crate::error::{ProxyError, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Validated configuration, ready for the supervisor to act on. Building
/// this is the only place addresses, ports and rates get parsed out of
/// strings — everything downstream works with typed values.
#[derive(Debug, Clone)]
pub struct Config {
    pub proxy_addr: IpAddr,
    pub client_port: u16,
    pub server_port: u16,
    pub client_addr: IpAddr,
    pub server_addr: IpAddr,
    pub client_drop: u8,
    pub server_drop: u8,
    pub client_delay: u8,
    pub server_delay: u8,
    pub corruption: u8,
    pub observer_port: u16,
    pub delay: Duration,
    pub received_log: PathBuf,
    pub sent_log: PathBuf,
}

impl Config {
    pub fn client_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.proxy_addr, self.client_port)
    }

    pub fn server_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.proxy_addr, self.server_port)
    }

    pub fn observer_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.proxy_addr, self.observer_port)
    }

    /// The real client's address, for the server→client pipeline's egress.
    /// Reuses `client_port` as the real client's port too, since the
    /// configuration only names one stable port per peer.
    pub fn real_client_addr(&self) -> SocketAddr {
        SocketAddr::new(self.client_addr, self.client_port)
    }

    pub fn real_server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_addr, self.server_port)
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            proxy_addr: cli.proxy_addr,
            client_port: cli.client_port,
            server_port: cli.server_port,
            client_addr: cli.client_addr,
            server_addr: cli.server_addr,
            client_drop: cli.client_drop,
            server_drop: cli.server_drop,
            client_delay: cli.client_delay,
            server_delay: cli.server_delay,
            corruption: cli.corruption,
            observer_port: cli.observer_port,
            delay: Duration::from_secs(cli.delay_secs),
            received_log: cli.received_log,
            sent_log: cli.sent_log,
        }
    }
}

/// Fatal, descriptive validation checked once at startup before any socket
/// is opened.
pub fn validate(config: &Config) -> Result<()> {
    if config.client_port == config.server_port {
        return Err(ProxyError::Config(format!(
            "client_port and server_port must differ, both are {}",
            config.client_port
        )));
    }
    if config.observer_port == config.client_port || config.observer_port == config.server_port {
        return Err(ProxyError::Config(
            "observer_port must not collide with client_port or server_port".into(),
        ));
    }
    for (name, rate) in [
        ("client_drop", config.client_drop),
        ("server_drop", config.server_drop),
        ("client_delay", config.client_delay),
        ("server_delay", config.server_delay),
        ("corruption", config.corruption),
    ] {
        if rate > 100 {
            return Err(ProxyError::Config(format!("{name} must be in [0, 100], got {rate}")));
        }
    }
    if config.delay.is_zero() {
        return Err(ProxyError::Config("delay_secs must be > 0".into()));
    }
    Ok(())
}
