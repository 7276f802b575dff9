use std::time::Duration;

use tallybridge_domain::TallyError;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "tallybridge=info";

/// Install a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_directive` (or [`DEFAULT_FILTER`] if that does not
/// parse). Returns `false` when a global subscriber was already installed.
pub fn init_tracing(default_directive: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.is_ok()
}

/// Log the outcome of a gateway operation with structured fields.
///
/// `operation` should be a stable identifier such as `"get_ledgers"`.
#[inline]
pub fn log_operation_outcome(operation: &str, elapsed: Duration, error: Option<&TallyError>) {
    let duration_ms = elapsed.as_millis() as u64;

    match error {
        None => info!(operation, duration_ms, "tally_operation_success"),
        Some(err) => warn!(
            operation,
            duration_ms,
            error_type = error_label(err),
            error = %err,
            "tally_operation_failure"
        ),
    }
}

/// Convert a `TallyError` into a stable label suitable for metrics/logging.
#[inline]
pub fn error_label(error: &TallyError) -> &'static str {
    match error {
        TallyError::ConnectionFailed(_) => "connection_failed",
        TallyError::Timeout(_) => "timeout",
        TallyError::RequestFailed(_) => "request_failed",
        TallyError::ResponseParseFailed(_) => "response_parse_failed",
        TallyError::OperationFailed { .. } => "operation_failed",
        TallyError::RetryExhausted { .. } => "retry_exhausted",
        TallyError::InvalidXml(_) => "invalid_xml",
        TallyError::CompanyNotFound(_) => "company_not_found",
        TallyError::Config(_) => "config",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(error_label(&TallyError::Timeout("x".into())), "timeout");
        assert_eq!(
            error_label(&TallyError::RetryExhausted {
                attempts: 2,
                last: Box::new(TallyError::ConnectionFailed("refused".into())),
            }),
            "retry_exhausted"
        );
        assert_eq!(error_label(&TallyError::Config("bad port".into())), "config");
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _ = init_tracing("not a [valid directive", false);
        assert!(!init_tracing(DEFAULT_FILTER, true));
    }
}
