/// One byte, pushed to the observer for every notable packet event.
///
/// `ReceivedAck` and `ResentPacket` are part of the declared code space but
/// are never emitted by any forwarding path — kept here rather than dropped
/// so an observer that matches exhaustively on the event byte never sees a
/// code it doesn't recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatsEvent {
    SentPacket = 0,
    ReceivedPacket = 1,
    #[allow(dead_code)]
    ReceivedAck = 2,
    #[allow(dead_code)]
    ResentPacket = 3,
    DroppedClientPacket = 4,
    DelayedClientPacket = 5,
    DroppedServerPacket = 6,
    DelayedServerPacket = 7,
    CorruptedData = 8,
}

impl StatsEvent {
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(StatsEvent::SentPacket.code(), 0);
        assert_eq!(StatsEvent::CorruptedData.code(), 8);
    }
}
