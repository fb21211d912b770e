mod transmitter;

pub use transmitter::*;
