//! Pooled HTTP client used by the Tally transport

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
