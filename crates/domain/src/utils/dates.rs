//! Tally date rendering (`YYYYMMDD`, no separators)

use chrono::NaiveDate;

use crate::constants::TALLY_DATE_FORMAT;
use crate::errors::{Result, TallyError};

/// Render a date the way Tally expects it in static variables.
///
/// ```
/// use chrono::NaiveDate;
/// use tallybridge_domain::format_tally_date;
///
/// let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// assert_eq!(format_tally_date(date), "20240115");
/// ```
pub fn format_tally_date(date: NaiveDate) -> String {
    date.format(TALLY_DATE_FORMAT).to_string()
}

/// Parse a strict eight-digit `YYYYMMDD` date.
///
/// Separated forms such as `2024-01-15` are rejected.
pub fn parse_tally_date(value: &str) -> Result<NaiveDate> {
    let invalid = || TallyError::ResponseParseFailed(format!("invalid tally date {value:?}"));

    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let year: i32 = value[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = value[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = value[6..8].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
