pub mod chain;
pub mod config;
pub mod exposure;
pub mod period;
pub mod snapshot;
