//! Tolerant decoding of Tally's numeric text
//!
//! Tally renders numbers with thousands separators, trailing units and
//! Dr/Cr suffixes (`"1,000.00 Dr"`, `"30 Days"`, `"5.00/Nos"`). One odd value
//! must not sink a whole export, so these deserializers keep the leading
//! number and fall back to `None`.

use serde::{Deserialize, Deserializer};

/// Leading numeric value of a Tally amount/quantity string.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    let end = cleaned
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)))
        .map_or(cleaned.len(), |(i, _)| i);

    cleaned[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Leading integral value; fractional input is truncated.
pub fn parse_integer(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.trunc() as i64)
}

/// `deserialize_with` target for optional decimal fields.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_number))
}

/// `deserialize_with` target for optional integral fields.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_integer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(parse_number("10000"), Some(10000.0));
        assert_eq!(parse_number("-10000"), Some(-10000.0));
        assert_eq!(parse_number(" 2.50 "), Some(2.5));
    }

    #[test]
    fn strips_separators_and_suffixes() {
        assert_eq!(parse_number("1,000.00 Dr"), Some(1000.0));
        assert_eq!(parse_number("5.00/Nos"), Some(5.0));
        assert_eq!(parse_integer("30 Days"), Some(30));
        assert_eq!(parse_integer("12.9"), Some(12));
    }

    #[test]
    fn unparseable_values_become_none() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("Not Applicable"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1-2"), Some(1.0));
    }

    #[test]
    fn deserializers_accept_missing_and_odd_values() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "lenient_f64")]
            amount: Option<f64>,
            #[serde(default, deserialize_with = "lenient_i64")]
            days: Option<i64>,
        }

        let row: Row = serde_json::from_str(r#"{"amount": "1,250.75 Cr", "days": "45 Days"}"#).unwrap();
        assert_eq!(row.amount, Some(1250.75));
        assert_eq!(row.days, Some(45));

        let row: Row = serde_json::from_str(r#"{"amount": "n/a"}"#).unwrap();
        assert_eq!(row.amount, None);
        assert_eq!(row.days, None);
    }
}
