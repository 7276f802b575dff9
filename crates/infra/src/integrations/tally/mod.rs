//! Tally ERP XML gateway integration
//!
//! Tally exposes a single HTTP endpoint that accepts an XML envelope and
//! answers with another one. Everything above the raw POST lives here.
//!
//! # Architecture
//!
//! - **Envelope**: typed request/response shapes ([`envelope`])
//! - **Request builder**: options to serialized envelopes ([`request`])
//! - **Context**: per-call cancellation and deadline ([`CallContext`])
//! - **Transport**: [`XmlTransport`] seam plus the bounded retry loop
//! - **Parser**: disambiguation of success and failure bodies, with a
//!   text-scan fallback ([`parse_response`]); records with repeated tags
//!   are repaired or skipped ([`repair`])
//! - **Client**: [`TallyClient`], the public entry point
//!
//! # Usage
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use tallybridge_domain::TallyConfig;
//! use tallybridge_infra::integrations::tally::{with_voucher_type, CallContext, TallyClient};
//!
//! # async fn example() -> tallybridge_domain::Result<()> {
//! let client = TallyClient::new(TallyConfig::default())?;
//! let ctx = CallContext::with_timeout(std::time::Duration::from_secs(60));
//!
//! let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
//! let to = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap_or_default();
//! let response = client.get_vouchers(&ctx, from, to, &[with_voucher_type("Sales")]).await?;
//! println!("{} vouchers", response.vouchers.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod context;
pub mod envelope;
pub mod parser;
pub mod repair;
pub mod request;
pub mod scan;
pub mod transport;

pub use client::{TallyClient, TallyClientBuilder};
pub use context::CallContext;
pub use parser::parse_response;
pub use request::{
    build_company_list_request, build_export_request, build_import_request, escape_xml,
    with_company, with_date_range, with_fetch_list, with_last_alter_id, with_ledger_name,
    with_voucher_type, RequestOption, RequestOptions,
};
pub use scan::{extract_companies_from_xml, extract_error_from_xml};
pub use transport::{send_with_retry, HttpTransport, RetryPolicy, XmlTransport};
