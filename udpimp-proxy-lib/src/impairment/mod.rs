//! Per-direction impairment policy: decide whether a packet passes, drops,
//! delays, or gets corrupted.

pub mod policy;
pub mod rates;

pub use policy::{classify, Classification};
pub use rates::{DirectionRates, Direction, Rates};
