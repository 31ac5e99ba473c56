//! The TCP stats-observer channel.

pub mod channel;
pub mod events;

pub use channel::StatsChannel;
pub use events::StatsEvent;
