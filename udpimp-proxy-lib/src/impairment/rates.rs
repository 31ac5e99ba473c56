use std::sync::atomic::{AtomicU8, Ordering};

/// Which way a packet is travelling through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

/// Live, shared impairment rates. Each field is an independent percentage in
/// `[0, 100]`; `drop + delay + corruption <= 100` is not enforced — see
/// [`super::policy::classify`] for how overlap is resolved.
///
/// Updates come from a single writer (the control-input task); reads happen
/// from every pipeline and delay task concurrently. `Relaxed` ordering is
/// sufficient — these values are advisory, not invariant-bearing.
#[derive(Debug, Default)]
pub struct Rates {
    pub client_drop: AtomicU8,
    pub server_drop: AtomicU8,
    pub client_delay: AtomicU8,
    pub server_delay: AtomicU8,
    pub corruption: AtomicU8,
}

/// Snapshot of the three thresholds relevant to one direction's classification.
#[derive(Debug, Clone, Copy)]
pub struct DirectionRates {
    pub drop: u8,
    pub delay: u8,
    pub corruption: u8,
}

impl Rates {
    pub fn new(client_drop: u8, server_drop: u8, client_delay: u8, server_delay: u8, corruption: u8) -> Self {
        Self {
            client_drop: AtomicU8::new(client_drop),
            server_drop: AtomicU8::new(server_drop),
            client_delay: AtomicU8::new(client_delay),
            server_delay: AtomicU8::new(server_delay),
            corruption: AtomicU8::new(corruption),
        }
    }

    pub fn snapshot(&self, direction: Direction) -> DirectionRates {
        let corruption = self.corruption.load(Ordering::Relaxed);
        match direction {
            Direction::ClientToServer => DirectionRates {
                drop: self.client_drop.load(Ordering::Relaxed),
                delay: self.client_delay.load(Ordering::Relaxed),
                corruption,
            },
            Direction::ServerToClient => DirectionRates {
                drop: self.server_drop.load(Ordering::Relaxed),
                delay: self.server_delay.load(Ordering::Relaxed),
                corruption,
            },
        }
    }

    /// Set one named field; returns `false` (no mutation) for an unknown
    /// name or an out-of-range value. Used by the control-input parser.
    pub fn set(&self, field: &str, value: u8) -> bool {
        if value > 100 {
            return false;
        }
        let target = match field {
            "client_drop" => &self.client_drop,
            "server_drop" => &self.server_drop,
            "client_delay" => &self.client_delay,
            "server_delay" => &self.server_delay,
            "corruption" => &self.corruption,
            _ => return false,
        };
        target.store(value, Ordering::Relaxed);
        true
    }
}
