//! Typed shape of Tally's XML envelopes
//!
//! Tag names and nesting are fixed by Tally. Nothing here validates; the
//! request builder fills these structs and the parser interprets them.

use serde::{Deserialize, Serialize};
use tallybridge_domain::utils::lenient::lenient_i64;
use tallybridge_domain::{CostCentre, ImportResult, Ledger, RequestType, StockItem, Voucher};

/// Namespace Tally expects on `TALLYMESSAGE` for user-defined fields.
pub const UDF_NAMESPACE: &str = "TallyUDF";

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename = "ENVELOPE")]
pub struct RequestEnvelope {
    #[serde(rename = "HEADER")]
    pub header: RequestHeader,
    #[serde(rename = "BODY")]
    pub body: RequestBody,
}

impl RequestEnvelope {
    pub fn export(desc: RequestDesc) -> Self {
        Self {
            header: RequestHeader::new(RequestType::ExportData),
            body: RequestBody::export(desc),
        }
    }

    pub fn import(desc: RequestDesc, message: TallyMessage) -> Self {
        Self {
            header: RequestHeader::new(RequestType::ImportData),
            body: RequestBody::import(desc, message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestHeader {
    #[serde(rename = "TALLYREQUEST")]
    pub tally_request: String,
    #[serde(rename = "TYPE", skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<String>,
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "VERSION", skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl RequestHeader {
    pub fn new(request_type: RequestType) -> Self {
        Self { tally_request: request_type.as_str().to_string(), request_kind: None, id: None, version: None }
    }
}

/// Exactly one of `EXPORTDATA` / `IMPORTDATA`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    #[serde(rename = "EXPORTDATA", skip_serializing_if = "Option::is_none")]
    export_data: Option<ExportData>,
    #[serde(rename = "IMPORTDATA", skip_serializing_if = "Option::is_none")]
    import_data: Option<ImportData>,
}

impl RequestBody {
    pub fn export(desc: RequestDesc) -> Self {
        Self { export_data: Some(ExportData { request_desc: desc }), import_data: None }
    }

    pub fn import(desc: RequestDesc, message: TallyMessage) -> Self {
        Self {
            export_data: None,
            import_data: Some(ImportData {
                request_desc: desc,
                request_data: RequestData { tally_message: message },
            }),
        }
    }

    pub fn export_data(&self) -> Option<&ExportData> {
        self.export_data.as_ref()
    }

    pub fn import_data(&self) -> Option<&ImportData> {
        self.import_data.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportData {
    #[serde(rename = "REQUESTDESC")]
    pub request_desc: RequestDesc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportData {
    #[serde(rename = "REQUESTDESC")]
    pub request_desc: RequestDesc,
    #[serde(rename = "REQUESTDATA")]
    pub request_data: RequestData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestData {
    #[serde(rename = "TALLYMESSAGE")]
    pub tally_message: TallyMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestDesc {
    #[serde(rename = "STATICVARIABLES", skip_serializing_if = "Option::is_none")]
    pub static_variables: Option<StaticVariables>,
    #[serde(rename = "REPORTNAME")]
    pub report_name: String,
    #[serde(rename = "FETCHLIST", skip_serializing_if = "Option::is_none")]
    pub fetch_list: Option<FetchList>,
}

/// Report filters. Unset fields produce no tag at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticVariables {
    #[serde(rename = "SVEXPORTFORMAT", skip_serializing_if = "Option::is_none")]
    pub export_format: Option<String>,
    #[serde(rename = "SVCURRENTCOMPANY", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "SVFROMDATE", skip_serializing_if = "Option::is_none")]
    pub from_date: Option<String>,
    #[serde(rename = "SVTODATE", skip_serializing_if = "Option::is_none")]
    pub to_date: Option<String>,
    #[serde(rename = "SVCDSSVDAYBOOKDATE", skip_serializing_if = "Option::is_none")]
    pub day_book_date: Option<String>,
    #[serde(rename = "VOUCHERTYPENAME", skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<String>,
    #[serde(rename = "LEDGERNAME", skip_serializing_if = "Option::is_none")]
    pub ledger_name: Option<String>,
    #[serde(rename = "LASTVCHRID", skip_serializing_if = "Option::is_none")]
    pub last_alter_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchList {
    #[serde(rename = "FETCH")]
    pub fields: Vec<String>,
}

// ============================================================================
// Shared containers
// ============================================================================

/// `TALLYMESSAGE`: the import payload, and an alternate container in
/// exports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TallyMessage {
    #[serde(rename = "@xmlns:UDF", default, skip_serializing_if = "Option::is_none")]
    pub udf_namespace: Option<String>,
    #[serde(rename = "LEDGER", default, skip_serializing_if = "Vec::is_empty")]
    pub ledgers: Vec<Ledger>,
    #[serde(rename = "COSTCENTRE", default, skip_serializing_if = "Vec::is_empty")]
    pub cost_centres: Vec<CostCentre>,
    #[serde(rename = "STOCKITEM", default, skip_serializing_if = "Vec::is_empty")]
    pub stock_items: Vec<StockItem>,
    #[serde(rename = "VOUCHER", default, skip_serializing_if = "Vec::is_empty")]
    pub vouchers: Vec<Voucher>,
}

impl TallyMessage {
    /// Import payload carrying the UDF namespace.
    pub fn for_import() -> Self {
        Self { udf_namespace: Some(UDF_NAMESPACE.to_string()), ..Self::default() }
    }
}

/// `COLLECTION`: the usual export container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Collection {
    #[serde(rename = "LEDGER", default)]
    pub ledgers: Vec<Ledger>,
    #[serde(rename = "COSTCENTRE", default)]
    pub cost_centres: Vec<CostCentre>,
    #[serde(rename = "STOCKITEM", default)]
    pub stock_items: Vec<StockItem>,
    #[serde(rename = "VOUCHER", default)]
    pub vouchers: Vec<Voucher>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "HEADER", default)]
    pub header: Option<ResponseHeader>,
    #[serde(rename = "BODY", default)]
    pub body: ResponseBody,
    #[serde(rename = "STATUS", default, deserialize_with = "lenient_i64")]
    pub status: Option<i64>,
    #[serde(rename = "LASTSTATUS", default, deserialize_with = "lenient_i64")]
    pub last_status: Option<i64>,
    #[serde(rename = "LINEERROR", default)]
    pub line_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResponseHeader {
    #[serde(rename = "VERSION", default)]
    pub version: Option<String>,
    #[serde(rename = "STATUS", default, deserialize_with = "lenient_i64")]
    pub status: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "DATA", default)]
    pub data: ResponseData,
    #[serde(rename = "IMPORTRESULT", default)]
    pub import_result: Option<ImportResult>,
    #[serde(rename = "LINEERROR", default)]
    pub line_error: Option<String>,
}

/// `BODY/DATA`. Tally splits large exports over repeated containers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseData {
    #[serde(rename = "COLLECTION", default)]
    pub collections: Vec<Collection>,
    #[serde(rename = "TALLYMESSAGE", default)]
    pub tally_messages: Vec<TallyMessage>,
    #[serde(rename = "IMPORTRESULT", default)]
    pub import_result: Option<ImportResult>,
    #[serde(rename = "LINEERROR", default)]
    pub line_error: Option<String>,
}
