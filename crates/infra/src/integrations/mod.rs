//! External service integrations

pub mod tally;
