//! # Tallybridge Domain
//!
//! Wire entities and error types for the Tally ERP gateway.
//!
//! This crate contains:
//! - Ledger, cost centre, stock item and voucher records as exported by Tally
//! - The normalized [`TallyResponse`] every gateway call returns
//! - The [`TallyError`] taxonomy and [`Result`] alias
//! - Connection configuration ([`TallyConfig`])
//!
//! ## Architecture
//! - No dependencies on other tallybridge crates
//! - No I/O: transport, parsing and configuration loading live in
//!   `tallybridge-infra`

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::dates::{format_tally_date, parse_tally_date};
