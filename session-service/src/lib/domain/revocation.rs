pub mod ports;
pub mod sweeper;
