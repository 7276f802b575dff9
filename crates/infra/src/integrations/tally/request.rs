//! Request options and envelope builders
//!
//! Every call starts from a fresh [`RequestOptions`] built from the
//! caller's [`RequestOption`] list. The builders turn options into an
//! envelope and serialize it; user-supplied strings are escaped by the
//! serializer.

use chrono::NaiveDate;
use quick_xml::se::{QuoteLevel, Serializer};
use serde::Serialize;
use tallybridge_domain::constants::EXPORT_FORMAT_XML;
use tallybridge_domain::{format_tally_date, ReportName, Result, TallyError};

use super::envelope::{FetchList, RequestDesc, RequestEnvelope, StaticVariables, TallyMessage};
use crate::errors::InfraError;

/// One per-call filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOption {
    Company(String),
    DateRange { from: NaiveDate, to: NaiveDate },
    VoucherType(String),
    LedgerName(String),
    LastAlterId(String),
    FetchList(Vec<String>),
}

/// Run the request against `company` instead of the configured one.
pub fn with_company(company: impl Into<String>) -> RequestOption {
    RequestOption::Company(company.into())
}

/// Restrict to `[from, to]`, both inclusive.
pub fn with_date_range(from: NaiveDate, to: NaiveDate) -> RequestOption {
    RequestOption::DateRange { from, to }
}

/// Accepts [`VoucherType`](tallybridge_domain::VoucherType) or any custom
/// voucher type name.
pub fn with_voucher_type(voucher_type: impl Into<String>) -> RequestOption {
    RequestOption::VoucherType(voucher_type.into())
}

pub fn with_ledger_name(ledger_name: impl Into<String>) -> RequestOption {
    RequestOption::LedgerName(ledger_name.into())
}

pub fn with_last_alter_id(alter_id: impl Into<String>) -> RequestOption {
    RequestOption::LastAlterId(alter_id.into())
}

/// Ask Tally for these fields only.
pub fn with_fetch_list<I, S>(fields: I) -> RequestOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    RequestOption::FetchList(fields.into_iter().map(Into::into).collect())
}

/// Resolved filters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub company: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub day_book_date: Option<NaiveDate>,
    pub voucher_type: Option<String>,
    pub ledger_name: Option<String>,
    pub last_alter_id: Option<String>,
    pub fetch_list: Vec<String>,
}

impl RequestOptions {
    pub fn from_options(options: &[RequestOption]) -> Self {
        let mut resolved = Self::default();
        resolved.apply(options);
        resolved
    }

    /// Apply options in order; later options win.
    pub fn apply(&mut self, options: &[RequestOption]) {
        for option in options {
            match option {
                RequestOption::Company(company) => self.company = Some(company.clone()),
                RequestOption::DateRange { from, to } => {
                    self.from_date = Some(*from);
                    self.to_date = Some(*to);
                }
                RequestOption::VoucherType(voucher_type) => {
                    self.voucher_type = Some(voucher_type.clone());
                }
                RequestOption::LedgerName(ledger_name) => {
                    self.ledger_name = Some(ledger_name.clone());
                }
                RequestOption::LastAlterId(alter_id) => self.last_alter_id = Some(alter_id.clone()),
                RequestOption::FetchList(fields) => self.fetch_list = fields.clone(),
            }
        }
    }

    fn static_variables(&self) -> StaticVariables {
        StaticVariables {
            export_format: Some(EXPORT_FORMAT_XML.to_string()),
            company: self.company.clone(),
            from_date: self.from_date.map(format_tally_date),
            to_date: self.to_date.map(format_tally_date),
            day_book_date: self.day_book_date.map(format_tally_date),
            voucher_type: self.voucher_type.clone(),
            ledger_name: self.ledger_name.clone(),
            last_alter_id: self.last_alter_id.clone(),
        }
    }

    fn fetch_list(&self) -> Option<FetchList> {
        (!self.fetch_list.is_empty()).then(|| FetchList { fields: self.fetch_list.clone() })
    }
}

/// `EXPORTDATA` envelope for `report`.
pub fn build_export_request(report: ReportName, options: &RequestOptions) -> Result<String> {
    let desc = RequestDesc {
        static_variables: Some(options.static_variables()),
        report_name: report.as_str().to_string(),
        fetch_list: options.fetch_list(),
    };

    to_xml(&RequestEnvelope::export(desc))
}

/// Minimal export used for reachability checks and the company list.
pub fn build_company_list_request() -> Result<String> {
    build_export_request(ReportName::ListOfCompanies, &RequestOptions::default())
}

/// `IMPORTDATA` envelope carrying `message` under `REQUESTDATA`.
pub fn build_import_request(
    report: ReportName,
    company: Option<&str>,
    message: TallyMessage,
) -> Result<String> {
    let static_variables = company.map(|company| StaticVariables {
        company: Some(company.to_string()),
        ..StaticVariables::default()
    });

    let desc = RequestDesc {
        static_variables,
        report_name: report.as_str().to_string(),
        fetch_list: None,
    };

    to_xml(&RequestEnvelope::import(desc, message))
}

/// Escape `& < > " '` for insertion into XML text or attributes.
pub fn escape_xml(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

fn to_xml<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = String::new();
    let mut serializer = Serializer::new(&mut buffer);
    serializer.set_quote_level(QuoteLevel::Full);
    value.serialize(serializer).map_err(|err| TallyError::from(InfraError::from(err)))?;
    Ok(buffer)
}
