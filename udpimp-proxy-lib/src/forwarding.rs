//! The per-direction forwarding pipeline:
//!
//! ```text
//! LISTEN → CLASSIFY → {DROP | DELAY | CORRUPT | PASS}
//! DROP    → LISTEN
//! DELAY   → LISTEN            (task continues in background)
//! CORRUPT → SEND
//! PASS    → SEND
//! SEND    → LISTEN
//! ```

use crate::delay::DelayScheduler;
use crate::error::{ProxyError, Result};
use crate::impairment::{classify, Classification, Direction, Rates};
use crate::logsink::CsvSink;
use crate::packet::{Packet, WIRE_LEN};
use crate::stats::{StatsChannel, StatsEvent};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Everything one direction's pipeline needs. `inbound` is the socket this
/// pipeline listens on; `outbound`/`outbound_dest` is where it forwards to —
/// the *other* direction's socket.
pub struct Pipeline {
    pub direction: Direction,
    pub inbound: Arc<UdpSocket>,
    pub outbound: Arc<UdpSocket>,
    pub outbound_dest: SocketAddr,
    pub rates: Arc<Rates>,
    pub stats: Arc<StatsChannel>,
    pub received_log: Arc<CsvSink>,
    pub sent_log: Arc<CsvSink>,
    pub delay_scheduler: DelayScheduler,
    pub rng_seed: u64,
    pub send_errors: AtomicU64,
    /// Shared with the supervisor and the other pipeline: a receive error on
    /// this socket is fatal for the whole process, so this pipeline flips
    /// the flag itself rather than relying on the supervisor to notice its
    /// task exited.
    pub shutdown_tx: watch::Sender<bool>,
}

fn dropped_event(direction: Direction) -> StatsEvent {
    match direction {
        Direction::ClientToServer => StatsEvent::DroppedClientPacket,
        Direction::ServerToClient => StatsEvent::DroppedServerPacket,
    }
}

fn delayed_event(direction: Direction) -> StatsEvent {
    match direction {
        Direction::ClientToServer => StatsEvent::DelayedClientPacket,
        Direction::ServerToClient => StatsEvent::DelayedServerPacket,
    }
}

impl Pipeline {
    /// Runs the LISTEN/CLASSIFY/act loop until `shutdown` fires. A packet
    /// already in flight always completes to SEND or DROP before the loop
    /// checks shutdown again.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(self.rng_seed);
        let mut buf = [0u8; WIRE_LEN];
        loop {
            tokio::select! {
                received = self.inbound.recv_from(&mut buf) => {
                    let (n, _src) = match received {
                        Ok(pair) => pair,
                        Err(err) => {
                            warn!(%err, direction = ?self.direction, "fatal receive error, shutting down");
                            let _ = self.shutdown_tx.send(true);
                            return Err(ProxyError::Io(err));
                        }
                    };
                    self.handle_datagram(&buf[..n], &mut rng).await;
                }
                _ = shutdown.changed() => {
                    debug!(direction = ?self.direction, "shutdown signal received, stopping pipeline");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_datagram(&self, raw: &[u8], rng: &mut SmallRng) {
        self.stats.emit(StatsEvent::ReceivedPacket).await;

        let mut packet = match Packet::decode(raw) {
            Ok(packet) => packet,
            Err(err) => {
                // Decode errors are forwarded unconditionally: we can't log
                // per-field CSV columns we don't have, but the raw bytes
                // still go out.
                warn!(%err, direction = ?self.direction, "failed to decode datagram, forwarding raw bytes");
                self.send_raw(raw).await;
                return;
            }
        };

        if let Err(err) = self.received_log.log(self.direction, &packet).await {
            warn!(%err, "failed to log received packet");
        }

        let rates = self.rates.snapshot(self.direction);
        match classify(rates, rng) {
            Classification::Drop => {
                self.stats.emit(dropped_event(self.direction)).await;
            }
            Classification::Delay => {
                self.delay_scheduler.schedule(
                    packet.clone(),
                    self.outbound_dest,
                    self.direction,
                    self.outbound.clone(),
                    self.stats.clone(),
                    self.sent_log.clone(),
                );
                self.stats.emit(delayed_event(self.direction)).await;
            }
            Classification::Corrupt => {
                if packet.effective_len() > 0 {
                    corrupt_in_place(&mut packet);
                    self.stats.emit(StatsEvent::CorruptedData).await;
                }
                self.send(&packet).await;
            }
            Classification::Pass => {
                self.send(&packet).await;
            }
        }
    }

    async fn send(&self, packet: &Packet) {
        let wire = packet.encode();
        match self.outbound.send_to(&wire, self.outbound_dest).await {
            Ok(_) => {
                self.stats.emit(StatsEvent::SentPacket).await;
                if let Err(err) = self.sent_log.log(self.direction, packet).await {
                    warn!(%err, "failed to log sent packet");
                }
            }
            Err(err) => self.note_send_error(err),
        }
    }

    async fn send_raw(&self, raw: &[u8]) {
        match self.outbound.send_to(raw, self.outbound_dest).await {
            Ok(_) => self.stats.emit(StatsEvent::SentPacket).await,
            Err(err) => self.note_send_error(err),
        }
    }

    /// Send failures are transient and must never stall the pipeline —
    /// logged and counted, not propagated. Only every 100th failure gets a
    /// `warn!` to avoid a log storm under a flaky egress path.
    fn note_send_error(&self, err: std::io::Error) {
        let count = self.send_errors.fetch_add(1, Ordering::Relaxed) + 1;
        if count % 100 == 1 {
            warn!(%err, direction = ?self.direction, count, "send failed");
        }
    }
}

/// Mutates the payload so its checksum no longer matches the stored one,
/// without touching `checksum` itself — the point is to exercise the
/// endpoints' integrity check, not to hide the corruption from it.
///
/// A single bitwise complement isn't always enough: the checksum's XOR term
/// is invariant under complementing an even-length payload (`[0x84, 0x84]`
/// and its complement `[0x7B, 0x7B]` both XOR-reduce to zero), so a blind
/// flip can leave `verify()` true. If that happens, this walks the first
/// byte through every other value until the checksum provably diverges —
/// varying one byte sweeps its XOR contribution through all 256 values, so
/// some value always breaks the match.
fn corrupt_in_place(packet: &mut Packet) {
    let len = packet.effective_len();
    flip_payload(packet, len);
    if !packet.verify() {
        return;
    }
    let original_first = first_byte(packet);
    for delta in 1..=u8::MAX {
        set_first_byte(packet, original_first.wrapping_add(delta));
        if !packet.verify() {
            return;
        }
    }
}

fn flip_payload(packet: &mut Packet, len: usize) {
    let buf = packet.payload_buf_mut();
    for byte in &mut buf[..len] {
        *byte = !*byte;
    }
}

fn first_byte(packet: &mut Packet) -> u8 {
    packet.payload_buf_mut()[0]
}

fn set_first_byte(packet: &mut Packet, value: u8) {
    packet.payload_buf_mut()[0] = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::flags::{ACK, PSHACK};
    use std::time::Duration;

    #[test]
    fn corruption_still_invalidates_checksum_on_xor_collision() {
        // [0x84, 0x84] XOR-reduces to 0, and so does its full bitwise
        // complement [0x7B, 0x7B] — a blind complement alone leaves this
        // payload's checksum unchanged.
        let mut packet = Packet::new(1, 1, PSHACK, 4, &[0x84, 0x84]);
        assert!(packet.verify());
        corrupt_in_place(&mut packet);
        assert!(!packet.verify());
    }

    #[test]
    fn corruption_invalidates_checksum_for_a_single_byte_payload() {
        let mut packet = Packet::new(1, 1, PSHACK, 4, b"\xff");
        corrupt_in_place(&mut packet);
        assert!(!packet.verify());
    }

    async fn make_pipeline(
        direction: Direction,
        rates: Rates,
        rng_seed: u64,
    ) -> (Arc<Pipeline>, Arc<UdpSocket>, SocketAddr, tempfile::TempDir) {
        let inbound = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let outbound_socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let outbound_dest = outbound_socket.local_addr().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let received_log = Arc::new(CsvSink::open(dir.path().join("received.csv")).await.unwrap());
        let sent_log = Arc::new(CsvSink::open(dir.path().join("sent.csv")).await.unwrap());
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let pipeline = Arc::new(Pipeline {
            direction,
            inbound: inbound.clone(),
            outbound: outbound_socket,
            outbound_dest,
            rates: Arc::new(rates),
            stats: Arc::new(StatsChannel::new()),
            received_log,
            sent_log,
            delay_scheduler: DelayScheduler::new(Duration::from_millis(50)),
            rng_seed,
            send_errors: AtomicU64::new(0),
            shutdown_tx,
        });
        (pipeline, inbound, outbound_dest, dir)
    }

    #[tokio::test]
    async fn pass_through_is_byte_identical_when_all_rates_zero() {
        let (pipeline, inbound, _outbound_dest, _dir) =
            make_pipeline(Direction::ClientToServer, Rates::default(), 1).await;
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let packet = Packet::new(100, 200, PSHACK, 4, b"hello");
        let wire = packet.encode();
        listener.send_to(&wire, inbound.local_addr().unwrap()).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(pipeline.clone().run(shutdown_rx));

        let recv_socket = pipeline.outbound.clone();
        let mut buf = [0u8; WIRE_LEN];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), recv_socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], &wire[..]);

        let _ = shutdown_tx.send(true);
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn full_drop_rate_delivers_nothing() {
        let rates = Rates::new(100, 0, 0, 0, 0);
        let (pipeline, inbound, _outbound_dest, _dir) =
            make_pipeline(Direction::ClientToServer, rates, 2).await;
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let packet = Packet::new(1, 1, ACK, 4, b"");
        listener.send_to(&packet.encode(), inbound.local_addr().unwrap()).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(pipeline.clone().run(shutdown_rx));

        let recv_socket = pipeline.outbound.clone();
        let mut buf = [0u8; WIRE_LEN];
        let result =
            tokio::time::timeout(Duration::from_millis(300), recv_socket.recv_from(&mut buf)).await;
        assert!(result.is_err(), "no datagram should have been forwarded");

        let _ = shutdown_tx.send(true);
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn full_corruption_flips_payload_but_keeps_checksum() {
        let rates = Rates::new(0, 0, 0, 0, 100);
        let (pipeline, inbound, _outbound_dest, _dir) =
            make_pipeline(Direction::ClientToServer, rates, 3).await;
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let packet = Packet::new(1, 1, PSHACK, 4, b"abc");
        listener.send_to(&packet.encode(), inbound.local_addr().unwrap()).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(pipeline.clone().run(shutdown_rx));

        let recv_socket = pipeline.outbound.clone();
        let mut buf = [0u8; WIRE_LEN];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), recv_socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let forwarded = Packet::decode(&buf[..n]).unwrap();

        assert_ne!(forwarded.payload(), b"abc");
        assert_eq!(forwarded.checksum, packet.checksum);
        assert!(!forwarded.verify());

        let _ = shutdown_tx.send(true);
        join.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_payload_skips_corruption_but_still_sends() {
        let rates = Rates::new(0, 0, 0, 0, 100);
        let (pipeline, inbound, _outbound_dest, _dir) =
            make_pipeline(Direction::ClientToServer, rates, 4).await;
        let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let packet = Packet::new(1, 1, ACK, 4, b"");
        listener.send_to(&packet.encode(), inbound.local_addr().unwrap()).await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(pipeline.clone().run(shutdown_rx));

        let recv_socket = pipeline.outbound.clone();
        let mut buf = [0u8; WIRE_LEN];
        let (n, _) = tokio::time::timeout(Duration::from_secs(1), recv_socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let forwarded = Packet::decode(&buf[..n]).unwrap();
        assert_eq!(forwarded, packet);

        let _ = shutdown_tx.send(true);
        join.await.unwrap().unwrap();
    }
}
