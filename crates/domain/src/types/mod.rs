//! Domain types and models
//!
//! Request/report identifiers live here; the exported entities and the
//! normalized response are in [`tally`].

pub mod tally;

use serde::{Deserialize, Serialize};

use crate::impl_wire_name_conversions;

pub use tally::*;

/// Value of `HEADER/TALLYREQUEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    ExportData,
    ImportData,
    Execute,
}

impl_wire_name_conversions!(RequestType {
    ExportData => "Export Data",
    ImportData => "Import Data",
    Execute => "Execute",
});

/// Report names understood by the Tally XML server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportName {
    AllMasters,
    ListOfLedgers,
    ListOfCostCentres,
    ListOfStockItems,
    ListOfVouchers,
    AlteredVouchers,
    DayBook,
    ListOfCompanies,
    StockSummary,
    /// Import target for voucher re-import.
    Vouchers,
}

impl_wire_name_conversions!(ReportName {
    AllMasters => "All Masters",
    ListOfLedgers => "List of Ledgers",
    ListOfCostCentres => "List of Cost Centres",
    ListOfStockItems => "List of Stock Items",
    ListOfVouchers => "List of Vouchers",
    AlteredVouchers => "Altered Vouchers",
    DayBook => "Day Book",
    ListOfCompanies => "List of Companies",
    StockSummary => "Stock Summary",
    Vouchers => "Vouchers",
});

/// Stock voucher types.
///
/// Companies can define their own types, so voucher-type filters take any
/// string; these are the names every install ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherType {
    Sales,
    Purchase,
    Receipt,
    Payment,
    Journal,
    Contra,
    CreditNote,
    DebitNote,
    DeliveryNote,
    ReceiptNote,
}

impl_wire_name_conversions!(VoucherType {
    Sales => "Sales",
    Purchase => "Purchase",
    Receipt => "Receipt",
    Payment => "Payment",
    Journal => "Journal",
    Contra => "Contra",
    CreditNote => "Credit Note",
    DebitNote => "Debit Note",
    DeliveryNote => "Delivery Note",
    ReceiptNote => "Receipt Note",
});

impl From<VoucherType> for String {
    fn from(value: VoucherType) -> Self {
        value.as_str().to_string()
    }
}
