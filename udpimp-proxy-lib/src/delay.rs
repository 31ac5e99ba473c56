//! The delay subsystem: a detached task per delayed packet.
//!
//! `Packet` derives `Clone`, which is a plain byte-wise copy of its fixed
//! fields and payload array — the delay task owns an independent value from
//! the moment it is spawned, instead of racing the pipeline's working buffer
//! on the next receive.

use crate::impairment::Direction;
use crate::logsink::CsvSink;
use crate::packet::Packet;
use crate::stats::{StatsChannel, StatsEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Default wall-clock delay applied to a packet classified as delayed.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Spawns bounded-lifetime delay tasks. The pool of outstanding tasks is
/// bounded only by memory; documented here rather than fixed, since an
/// artificial cap would mean dropping packets the policy chose to delay
/// rather than pass.
#[derive(Debug, Clone)]
pub struct DelayScheduler {
    delay: Duration,
}

impl DelayScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Spawns a detached task that sleeps `self.delay`, sends `packet` to
    /// `destination` on `socket`, emits `SentPacket`, and logs the send. The
    /// task is fire-and-forget: the supervisor never joins it.
    pub fn schedule(
        &self,
        packet: Packet,
        destination: SocketAddr,
        direction: Direction,
        socket: Arc<UdpSocket>,
        stats: Arc<StatsChannel>,
        sent_log: Arc<CsvSink>,
    ) {
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let wire = packet.encode();
            if let Err(err) = socket.send_to(&wire, destination).await {
                warn!(%err, %destination, "delayed packet send failed");
                return;
            }
            debug!(%destination, seq = packet.seq_number, "delayed packet sent");
            stats.emit(StatsEvent::SentPacket).await;
            if let Err(err) = sent_log.log(direction, &packet).await {
                warn!(%err, "failed to log sent packet");
            }
        });
    }
}
