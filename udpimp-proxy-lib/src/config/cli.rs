use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line surface for starting the proxy. There is no TOML/file-based
/// config layer here — the configuration surface is small enough that a
/// flat CLI is the right fit, with validation split into
/// [`super::validate`].
#[derive(Parser, Debug)]
#[command(author, version, about = "Lossy UDP middlebox for reliable-transport testing")]
pub struct Cli {
    /// Address the proxy's sockets bind on.
    #[arg(long, default_value = "0.0.0.0", env = "UDPIMP_PROXY_ADDR")]
    pub proxy_addr: IpAddr,

    /// Real client address packets are forwarded to on the downstream leg.
    #[arg(long, env = "UDPIMP_CLIENT_ADDR")]
    pub client_addr: IpAddr,

    /// Real server address packets are forwarded to on the upstream leg.
    #[arg(long, env = "UDPIMP_SERVER_ADDR")]
    pub server_addr: IpAddr,

    /// Fixed port the client-facing socket binds on.
    #[arg(long, default_value_t = 8000, env = "UDPIMP_CLIENT_PORT")]
    pub client_port: u16,

    /// Fixed port the server-facing socket binds on.
    #[arg(long, default_value_t = 8050, env = "UDPIMP_SERVER_PORT")]
    pub server_port: u16,

    /// Initial client-to-server drop percentage, in [0, 100].
    #[arg(long, default_value_t = 0, env = "UDPIMP_CLIENT_DROP")]
    pub client_drop: u8,

    /// Initial server-to-client drop percentage, in [0, 100].
    #[arg(long, default_value_t = 0, env = "UDPIMP_SERVER_DROP")]
    pub server_drop: u8,

    /// Initial client-to-server delay percentage, in [0, 100].
    #[arg(long, default_value_t = 0, env = "UDPIMP_CLIENT_DELAY")]
    pub client_delay: u8,

    /// Initial server-to-client delay percentage, in [0, 100].
    #[arg(long, default_value_t = 0, env = "UDPIMP_SERVER_DELAY")]
    pub server_delay: u8,

    /// Initial corruption percentage, shared by both directions, in [0, 100].
    #[arg(long, default_value_t = 0, env = "UDPIMP_CORRUPTION")]
    pub corruption: u8,

    /// Port the TCP stats-observer channel listens on.
    #[arg(long, default_value_t = 61060, env = "UDPIMP_OBSERVER_PORT")]
    pub observer_port: u16,

    /// Fixed wall-clock delay applied to a packet classified as delayed.
    #[arg(long, default_value_t = 5, env = "UDPIMP_DELAY_SECS")]
    pub delay_secs: u64,

    /// Path to the received-packet CSV log.
    #[arg(long, default_value = "proxy_received_data.csv", env = "UDPIMP_RECEIVED_LOG")]
    pub received_log: PathBuf,

    /// Path to the sent-packet CSV log.
    #[arg(long, default_value = "proxy_sent_data.csv", env = "UDPIMP_SENT_LOG")]
    pub sent_log: PathBuf,
}
