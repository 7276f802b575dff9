//! # Tallybridge Infrastructure
//!
//! Impure half of the Tally gateway client.
//!
//! This crate contains:
//! - The pooled HTTP client and `reqwest` error classification
//! - Configuration loading from files and the environment
//! - Tracing subscriber setup
//! - The Tally XML integration (envelopes, retry, parsing, client API)
//!
//! ## Architecture
//! - Data types and the error taxonomy come from `tallybridge-domain`
//! - Contains all I/O

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::tally::{CallContext, RetryPolicy, TallyClient, TallyClientBuilder, XmlTransport};
pub use observability::init_tracing;
