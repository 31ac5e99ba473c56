//! Wires up both sockets, both CSV sinks, the stats-observer listener and
//! the control-input task, then runs until shutdown.
//!
//! Binding happens before anything starts: if any bind or file-open fails,
//! nothing has started yet and `run()` returns a startup error cleanly.

use crate::config::Config;
use crate::control;
use crate::delay::DelayScheduler;
use crate::error::Result;
use crate::forwarding::Pipeline;
use crate::impairment::{Direction, Rates};
use crate::logsink::CsvSink;
use crate::stats::StatsChannel;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::watch;
use tracing::info;

pub async fn run(config: Config) -> Result<()> {
    let client_socket = Arc::new(UdpSocket::bind(config.client_bind_addr()).await?);
    let server_socket = Arc::new(UdpSocket::bind(config.server_bind_addr()).await?);
    let observer_listener = TcpListener::bind(config.observer_bind_addr()).await?;
    info!(
        client = %config.client_bind_addr(),
        server = %config.server_bind_addr(),
        observer = %config.observer_bind_addr(),
        "sockets bound"
    );

    let received_log = Arc::new(CsvSink::open(&config.received_log).await?);
    let sent_log = Arc::new(CsvSink::open(&config.sent_log).await?);

    let rates = Arc::new(Rates::new(
        config.client_drop,
        config.server_drop,
        config.client_delay,
        config.server_delay,
        config.corruption,
    ));
    let stats = Arc::new(StatsChannel::new());
    let delay_scheduler = DelayScheduler::new(config.delay);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    let client_to_server = Arc::new(Pipeline {
        direction: Direction::ClientToServer,
        inbound: client_socket.clone(),
        outbound: server_socket.clone(),
        outbound_dest: config.real_server_addr(),
        rates: rates.clone(),
        stats: stats.clone(),
        received_log: received_log.clone(),
        sent_log: sent_log.clone(),
        delay_scheduler: delay_scheduler.clone(),
        rng_seed: seed ^ 0x5A5A_5A5A,
        send_errors: AtomicU64::new(0),
        shutdown_tx: shutdown_tx.clone(),
    });
    let server_to_client = Arc::new(Pipeline {
        direction: Direction::ServerToClient,
        inbound: server_socket,
        outbound: client_socket,
        outbound_dest: config.real_client_addr(),
        rates: rates.clone(),
        stats: stats.clone(),
        received_log,
        sent_log,
        delay_scheduler,
        rng_seed: seed ^ 0xA5A5_A5A5,
        send_errors: AtomicU64::new(0),
        shutdown_tx: shutdown_tx.clone(),
    });

    let c2s_handle = tokio::spawn(client_to_server.run(shutdown_rx.clone()));
    let s2c_handle = tokio::spawn(server_to_client.run(shutdown_rx.clone()));

    let stats_for_accept = stats.clone();
    let stats_shutdown = shutdown_rx.clone();
    let stats_handle =
        tokio::spawn(async move { stats_for_accept.accept_loop(observer_listener, stats_shutdown).await });

    let control_rates = rates.clone();
    let control_shutdown = shutdown_rx.clone();
    let control_handle = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        control::run(stdin, control_rates, control_shutdown).await
    });

    // A pipeline flips `shutdown_tx` itself on a fatal receive error, so
    // waiting on ctrl_c and on the shared watch value is sufficient to
    // notice either trigger without double-polling any JoinHandle.
    let mut supervisor_shutdown_rx = shutdown_rx.clone();
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
            let _ = shutdown_tx.send(true);
        }
        _ = supervisor_shutdown_rx.changed() => {
            info!("a pipeline triggered shutdown");
        }
    }

    let _ = tokio::join!(c2s_handle, s2c_handle, stats_handle, control_handle);

    info!("shutdown complete");
    Ok(())
}
