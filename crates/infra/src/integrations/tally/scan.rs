//! Last-resort text scanning of bodies that did not decode
//!
//! Only used after structured decoding failed, or for the company list whose
//! shape varies between Tally releases. Matching is literal, so tags with
//! attributes (`<LINEERROR TYPE="String">`) are not recognized.

use std::borrow::Cow;

use tallybridge_domain::constants::UNKNOWN_ERROR;

/// Error tags in the order they are tried.
pub const ERROR_MARKERS: [&str; 5] = ["LINEERROR", "ERROR", "ERRORMSG", "LASTMSG", "LASTREASON"];

const COMPANY_NAME_ATTR: &str = "<COMPANY NAME=\"";

/// First non-blank error message, trying markers in priority order.
pub fn find_error_marker(raw: &str) -> Option<String> {
    ERROR_MARKERS
        .iter()
        .find_map(|tag| element_texts(raw, tag).into_iter().find(|text| !text.is_empty()))
}

/// Error text from a raw body, or `"unknown error"` when nothing matches.
pub fn extract_error_from_xml(raw: &str) -> String {
    find_error_marker(raw).unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

/// Company names from a `List of Companies` export.
///
/// Reads every `<COMPANY NAME="...">` attribute; when there are none, falls
/// back to every `<NAME>...</NAME>` element. Names keep first-seen order
/// and appear once.
pub fn extract_companies_from_xml(raw: &str) -> Vec<String> {
    let mut names = attribute_values(raw, COMPANY_NAME_ATTR);
    if names.is_empty() {
        names = element_texts(raw, "NAME");
    }

    let mut companies: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !name.is_empty() && !companies.contains(&name) {
            companies.push(name);
        }
    }
    companies
}

/// Trimmed, unescaped text of every `<tag>...</tag>` in document order.
fn element_texts(raw: &str, tag: &str) -> Vec<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut texts = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(&close) else {
            break;
        };
        texts.push(unescape(after_open[..end].trim()));
        rest = &after_open[end + close.len()..];
    }

    texts
}

/// Unescaped values following each occurrence of `prefix` up to the next `"`.
fn attribute_values(raw: &str, prefix: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find(prefix) {
        let after_prefix = &rest[start + prefix.len()..];
        let Some(end) = after_prefix.find('"') else {
            break;
        };
        values.push(unescape(after_prefix[..end].trim()));
        rest = &after_prefix[end + 1..];
    }

    values
}

fn unescape(text: &str) -> String {
    quick_xml::escape::unescape(text).unwrap_or(Cow::Borrowed(text)).into_owned()
}
