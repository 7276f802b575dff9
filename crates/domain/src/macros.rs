//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Tally identifies request types, reports and voucher types by fixed
//! human-readable names ("Export Data", "List of Ledgers", "Credit Note").
//! This macro maps each enum variant to its exact wire name for `Display`
//! and parses names back case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use tallybridge_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Report {
//!     Ledgers,
//!     DayBook,
//! }
//!
//! impl_wire_name_conversions!(Report {
//!     Ledgers => "List of Ledgers",
//!     DayBook => "Day Book",
//! });
//!
//! assert_eq!(Report::DayBook.to_string(), "Day Book");
//! assert_eq!("list of ledgers".parse::<Report>(), Ok(Report::Ledgers));
//! ```

/// Implements `as_str`, Display and FromStr for wire-name enums
///
/// This macro generates:
/// - `as_str()`: the exact wire name of the variant
/// - Display trait: writes the exact wire name
/// - FromStr trait: parses case-insensitive names to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their wire names
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Exact name used on the wire.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($str) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestReport {
        Ledgers,
        CostCentres,
        DayBook,
    }

    impl_wire_name_conversions!(TestReport {
        Ledgers => "List of Ledgers",
        CostCentres => "List of Cost Centres",
        DayBook => "Day Book",
    });

    #[test]
    fn test_display_uses_wire_name() {
        assert_eq!(TestReport::Ledgers.to_string(), "List of Ledgers");
        assert_eq!(TestReport::CostCentres.to_string(), "List of Cost Centres");
        assert_eq!(TestReport::DayBook.as_str(), "Day Book");
    }

    #[test]
    fn test_fromstr_ignores_case_and_padding() {
        assert_eq!(TestReport::from_str("day book").unwrap(), TestReport::DayBook);
        assert_eq!(TestReport::from_str("LIST OF LEDGERS").unwrap(), TestReport::Ledgers);
        assert_eq!(TestReport::from_str("  List of Cost Centres ").unwrap(), TestReport::CostCentres);
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = TestReport::from_str("Balance Sheet");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid TestReport: Balance Sheet"));
    }

    #[test]
    fn test_roundtrip() {
        for report in [TestReport::Ledgers, TestReport::CostCentres, TestReport::DayBook] {
            let parsed = TestReport::from_str(&report.to_string()).unwrap();
            assert_eq!(report, parsed);
        }
    }
}
