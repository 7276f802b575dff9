//! Pure helpers for Tally's textual value formats

pub mod dates;
pub mod lenient;
