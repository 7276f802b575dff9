//! Tally entities and the normalized gateway response
//!
//! Field names follow Tally's XML tags exactly, including list-wrapper tags
//! such as `ALLLEDGERENTRIES.LIST`. Attributes use the `@` prefix so the
//! same structs serve for decoding exports and encoding imports.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_FAILURE, STATUS_SUCCESS};
use crate::errors::Result;
use crate::utils::dates::parse_tally_date;
use crate::utils::lenient::{lenient_f64, lenient_i64};

/// Tally booleans are the literal strings `Yes` / `No`.
fn is_yes(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("yes"))
}

// ============================================================================
// Masters
// ============================================================================

/// Account in the chart of accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "@NAME", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "NAME", default, skip_serializing_if = "Option::is_none")]
    pub ledger_name: Option<String>,
    #[serde(rename = "PARENT", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "ISBILLWISEON", default, skip_serializing_if = "Option::is_none")]
    pub is_bill_wise_on: Option<String>,
    #[serde(
        rename = "OPENINGBALANCE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_balance: Option<f64>,
    #[serde(
        rename = "CLOSINGBALANCE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub closing_balance: Option<f64>,
    #[serde(rename = "MASTERID", default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(rename = "ALTERID", default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<String>,
    #[serde(rename = "PARTYGSTIN", default, skip_serializing_if = "Option::is_none")]
    pub gst_registration: Option<String>,
    #[serde(rename = "INCOMETAXNUMBER", default, skip_serializing_if = "Option::is_none")]
    pub pan_number: Option<String>,
    /// Credit period in days.
    #[serde(
        rename = "CREDITPERIOD",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub credit_period: Option<i64>,
    #[serde(
        rename = "CREDITLIMIT",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub credit_limit: Option<f64>,
    #[serde(rename = "BANKDETAILS", default, skip_serializing_if = "Option::is_none")]
    pub bank_details: Option<BankDetails>,
    #[serde(rename = "ADDRESS.LIST", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<AddressList>,
}

impl Ledger {
    /// `NAME` attribute, falling back to the `NAME` element.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.ledger_name.as_deref())
    }

    pub fn is_bill_wise(&self) -> bool {
        is_yes(self.is_bill_wise_on.as_deref())
    }

    /// Address lines, empty when the ledger has none.
    pub fn address_lines(&self) -> &[String] {
        self.address.as_ref().map_or(&[], |list| list.lines.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(rename = "BANKNAME", default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(rename = "ACCOUNTNUMBER", default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(rename = "IFSCODE", default, skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressList {
    #[serde(rename = "ADDRESS", default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
}

/// Cost/profit allocation dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCentre {
    #[serde(rename = "@NAME", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "NAME", default, skip_serializing_if = "Option::is_none")]
    pub cost_centre_name: Option<String>,
    #[serde(rename = "PARENT", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "CATEGORY", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "ISREVENUE", default, skip_serializing_if = "Option::is_none")]
    pub is_revenue: Option<String>,
    #[serde(rename = "MASTERID", default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(rename = "ALTERID", default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<String>,
}

impl CostCentre {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.cost_centre_name.as_deref())
    }

    pub fn is_revenue(&self) -> bool {
        is_yes(self.is_revenue.as_deref())
    }
}

/// Inventory SKU with pricing and tax metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(rename = "@NAME", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "NAME", default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(rename = "PARENT", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "CATEGORY", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "BASEUNITS", default, skip_serializing_if = "Option::is_none")]
    pub base_units: Option<String>,
    #[serde(
        rename = "OPENINGBALANCE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_balance: Option<f64>,
    #[serde(
        rename = "OPENINGRATE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_rate: Option<f64>,
    #[serde(
        rename = "OPENINGVALUE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub opening_value: Option<f64>,
    #[serde(
        rename = "GSTRATE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub gst_rate: Option<f64>,
    #[serde(rename = "HSNCODE", default, skip_serializing_if = "Option::is_none")]
    pub hsn_code: Option<String>,
    #[serde(rename = "PARTNUMBER", default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(rename = "ISBATCHWISEON", default, skip_serializing_if = "Option::is_none")]
    pub is_batch_wise_on: Option<String>,
    #[serde(rename = "HASMFGDATE", default, skip_serializing_if = "Option::is_none")]
    pub has_mfg_date: Option<String>,
    #[serde(
        rename = "STANDARDCOST",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub standard_cost: Option<f64>,
    #[serde(
        rename = "STANDARDPRICE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub standard_price: Option<f64>,
    #[serde(
        rename = "MRP",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub mrp: Option<f64>,
    #[serde(
        rename = "REORDERLEVEL",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub reorder_level: Option<f64>,
    #[serde(
        rename = "MINORDERQTY",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_order_qty: Option<f64>,
    #[serde(rename = "MASTERID", default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(rename = "ALTERID", default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<String>,
}

impl StockItem {
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.item_name.as_deref())
    }

    pub fn is_batch_wise(&self) -> bool {
        is_yes(self.is_batch_wise_on.as_deref())
    }
}

// ============================================================================
// Vouchers
// ============================================================================

/// A recorded transaction with its ledger and inventory lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    #[serde(rename = "@VCHTYPE", default, skip_serializing_if = "Option::is_none")]
    pub vch_type: Option<String>,
    #[serde(rename = "@ACTION", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(rename = "@OBJVIEW", default, skip_serializing_if = "Option::is_none")]
    pub obj_view: Option<String>,
    #[serde(rename = "VOUCHERTYPENAME", default, skip_serializing_if = "Option::is_none")]
    pub voucher_type: Option<String>,
    #[serde(rename = "VOUCHERNUMBER", default, skip_serializing_if = "Option::is_none")]
    pub voucher_number: Option<String>,
    /// `YYYYMMDD`; see [`Voucher::parsed_date`].
    #[serde(rename = "DATE", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "EFFECTIVEDATE", default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(rename = "PARTYLEDGERNAME", default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    #[serde(rename = "NARRATION", default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(rename = "REFERENCE", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "REFERENCEDATE", default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<String>,
    #[serde(rename = "PARTYGSTIN", default, skip_serializing_if = "Option::is_none")]
    pub party_gstin: Option<String>,
    #[serde(rename = "ISCANCELLED", default, skip_serializing_if = "Option::is_none")]
    pub is_cancelled: Option<String>,
    #[serde(rename = "ISOPTIONAL", default, skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<String>,
    #[serde(rename = "MASTERID", default, skip_serializing_if = "Option::is_none")]
    pub master_id: Option<String>,
    #[serde(rename = "ALTERID", default, skip_serializing_if = "Option::is_none")]
    pub alter_id: Option<String>,
    #[serde(rename = "VCHKEY", default, skip_serializing_if = "Option::is_none")]
    pub vch_key: Option<String>,
    #[serde(rename = "ALLLEDGERENTRIES.LIST", default, skip_serializing_if = "Vec::is_empty")]
    pub ledger_entries: Vec<LedgerEntry>,
    #[serde(rename = "ALLINVENTORYENTRIES.LIST", default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_entries: Vec<InventoryEntry>,
    #[serde(rename = "BILLALLOCATIONS.LIST", default, skip_serializing_if = "Vec::is_empty")]
    pub bill_allocations: Vec<BillAllocation>,
}

impl Voucher {
    /// `VOUCHERTYPENAME`, falling back to the `VCHTYPE` attribute.
    pub fn type_name(&self) -> Option<&str> {
        self.voucher_type.as_deref().or(self.vch_type.as_deref())
    }

    /// Voucher date as a calendar date. `Ok(None)` when the tag is absent.
    pub fn parsed_date(&self) -> Result<Option<NaiveDate>> {
        self.date.as_deref().map(str::trim).map(parse_tally_date).transpose()
    }

    pub fn is_cancelled(&self) -> bool {
        is_yes(self.is_cancelled.as_deref())
    }

    pub fn is_optional(&self) -> bool {
        is_yes(self.is_optional.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "LEDGERNAME", default, skip_serializing_if = "Option::is_none")]
    pub ledger_name: Option<String>,
    #[serde(rename = "ISDEEMEDPOSITIVE", default, skip_serializing_if = "Option::is_none")]
    pub is_deemed_positive: Option<String>,
    #[serde(rename = "ISPARTYLEDGER", default, skip_serializing_if = "Option::is_none")]
    pub is_party_ledger: Option<String>,
    #[serde(
        rename = "AMOUNT",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(rename = "COSTCENTRE", default, skip_serializing_if = "Option::is_none")]
    pub cost_centre: Option<String>,
}

impl LedgerEntry {
    /// Tally's sign flag; `Yes` marks the debit side.
    pub fn is_debit(&self) -> bool {
        is_yes(self.is_deemed_positive.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(rename = "STOCKITEMNAME", default, skip_serializing_if = "Option::is_none")]
    pub stock_item_name: Option<String>,
    #[serde(rename = "ISDEEMEDPOSITIVE", default, skip_serializing_if = "Option::is_none")]
    pub is_deemed_positive: Option<String>,
    #[serde(
        rename = "ACTUALQTY",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual_qty: Option<f64>,
    #[serde(
        rename = "BILLEDQTY",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub billed_qty: Option<f64>,
    #[serde(
        rename = "RATE",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub rate: Option<f64>,
    #[serde(
        rename = "AMOUNT",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
    #[serde(rename = "GODOWNNAME", default, skip_serializing_if = "Option::is_none")]
    pub godown_name: Option<String>,
    #[serde(rename = "BATCHNAME", default, skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillAllocation {
    #[serde(rename = "NAME", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `New Ref`, `Agst Ref`, `Advance` or `On Account`.
    #[serde(rename = "BILLTYPE", default, skip_serializing_if = "Option::is_none")]
    pub bill_type: Option<String>,
    #[serde(
        rename = "AMOUNT",
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<f64>,
}

// ============================================================================
// Import results
// ============================================================================

/// Counters Tally reports after an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(
        rename = "CREATED",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<i64>,
    #[serde(
        rename = "ALTERED",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub altered: Option<i64>,
    #[serde(
        rename = "DELETED",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted: Option<i64>,
    #[serde(
        rename = "IGNORED",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub ignored: Option<i64>,
    #[serde(
        rename = "ERRORS",
        default,
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub errors: Option<i64>,
    #[serde(rename = "LASTERROR", default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(rename = "LASTREASON", default, skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<String>,
}

impl ImportResult {
    /// Trimmed `LASTERROR`, `None` when blank.
    pub fn error_text(&self) -> Option<&str> {
        self.last_error.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// `"{LASTERROR}: {LASTREASON}"`, or `LASTERROR` alone without a reason.
    pub fn error_message(&self) -> Option<String> {
        let error = self.error_text()?;
        let reason = self.last_reason.as_deref().map(str::trim).filter(|s| !s.is_empty());
        Some(match reason {
            Some(reason) => format!("{error}: {reason}"),
            None => error.to_string(),
        })
    }
}

// ============================================================================
// Normalized response
// ============================================================================

/// Container an entity slice was taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// `BODY/DATA/COLLECTION`
    Collection,
    /// `BODY/DATA/TALLYMESSAGE`
    TallyMessage,
    /// Neither container held this entity.
    #[default]
    None,
}

/// Which container won for each entity slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySources {
    pub ledgers: DataSource,
    pub cost_centres: DataSource,
    pub stock_items: DataSource,
    pub vouchers: DataSource,
}

/// Transport-agnostic result of one gateway call.
///
/// `status` is [`STATUS_SUCCESS`] or [`STATUS_FAILURE`]. A failed response
/// always carries error text and no entities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TallyResponse {
    pub status: i32,
    pub error: String,
    pub raw_xml: String,
    /// Wall-clock time from the first attempt to completion.
    pub duration: Duration,
    pub ledgers: Vec<Ledger>,
    pub cost_centres: Vec<CostCentre>,
    pub stock_items: Vec<StockItem>,
    pub vouchers: Vec<Voucher>,
    pub import_result: Option<ImportResult>,
    pub sources: EntitySources,
}

impl TallyResponse {
    /// Failed response with the given error text.
    pub fn failure(error: impl Into<String>, raw_xml: impl Into<String>) -> Self {
        Self {
            status: STATUS_FAILURE,
            error: error.into(),
            raw_xml: raw_xml.into(),
            ..Self::default()
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn has_data(&self) -> bool {
        self.entity_count() > 0
    }

    /// Total entities across all four slices.
    pub fn entity_count(&self) -> usize {
        self.ledgers.len() + self.cost_centres.len() + self.stock_items.len() + self.vouchers.len()
    }
}
