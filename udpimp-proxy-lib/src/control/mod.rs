//! Live control-input: updates impairment rates from an operator stream.

pub mod reader;

pub use reader::run;
