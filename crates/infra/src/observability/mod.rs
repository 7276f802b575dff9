//! Logging and tracing setup
//!
//! The gateway only emits `tracing` events; installing a subscriber is left
//! to the embedding process, with [`init_tracing`] as the stock choice.

pub mod logging;

pub use logging::{error_label, init_tracing, log_operation_outcome, DEFAULT_FILTER};
