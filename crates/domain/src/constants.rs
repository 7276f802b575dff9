//! Gateway constants
//!
//! Defaults mirror the values the ERP ships with; the wire literals are fixed
//! by the external system.

// Connection defaults
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

// Wire literals
pub const EXPORT_FORMAT_XML: &str = "$$SysName:XML";
pub const TALLY_DATE_FORMAT: &str = "%Y%m%d";

/// Error text used when a failed response carries no recognizable marker.
pub const UNKNOWN_ERROR: &str = "unknown error";

// Normalized response status values
pub const STATUS_FAILURE: i32 = 0;
pub const STATUS_SUCCESS: i32 = 1;
