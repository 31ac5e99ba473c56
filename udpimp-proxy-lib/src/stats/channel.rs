use super::events::StatsEvent;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Accepts a single TCP observer and pushes one raw byte per [`StatsEvent`].
///
/// At most one observer is active at a time. A new connection replaces the
/// old one, closing it first rather than leaking the descriptor. A write
/// failure is logged and drops the slot; it never propagates to the
/// pipelines that called `emit`.
#[derive(Debug, Default)]
pub struct StatsChannel {
    slot: Mutex<Option<TcpStream>>,
}

impl StatsChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one event byte to the current observer, if any. A write error
    /// closes the slot so the next accepted connection replaces it.
    pub async fn emit(&self, event: StatsEvent) {
        let mut guard = self.slot.lock().await;
        if let Some(stream) = guard.as_mut() {
            if let Err(err) = stream.write_all(&[event.code()]).await {
                warn!(%err, "stats write failed, dropping observer connection");
                *guard = None;
            }
        }
    }

    /// Runs the accept loop until `shutdown` fires. Each accepted connection
    /// replaces (and closes) whatever observer was previously connected.
    pub async fn accept_loop(&self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.replace_observer(stream, addr).await,
                        Err(err) => warn!(%err, "failed to accept observer connection"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("shutdown signal received, stopping stats accept loop");
                    break;
                }
            }
        }
    }

    async fn replace_observer(&self, stream: TcpStream, addr: SocketAddr) {
        let mut guard = self.slot.lock().await;
        if let Some(mut old) = guard.take() {
            let _ = old.shutdown().await;
        }
        *guard = Some(stream);
        drop(guard);
        info!(%addr, "observer connected");
    }
}
