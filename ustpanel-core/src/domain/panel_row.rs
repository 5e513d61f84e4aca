//! PanelRow: one security on one business date.

use super::auction::{IssuanceType, SecurityType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single (CUSIP, business date) observation in the dense panel.
///
/// Static attributes (`tenor`, `coupon`, `maturity_date`, flags, type) are
/// constant for a CUSIP. `amount_issued` is non-zero only on issue dates;
/// `total_issued` is its running sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelRow {
    pub date: NaiveDate,
    pub cusip: String,
    pub security_type: SecurityType,
    pub tenor: Option<u16>,
    /// 0 = on-the-run, −1 = when-issued.
    pub vintage: i32,
    pub coupon: Option<f64>,
    pub maturity_date: NaiveDate,
    #[serde(rename = "isTIPS")]
    pub is_tips: bool,
    pub is_floating_rate: bool,
    pub first_issue_date: NaiveDate,
    pub issuance_type: Option<IssuanceType>,
    pub auction_date: NaiveDate,
    pub unscheduled_reopening_date: Option<NaiveDate>,
    pub amount_issued: f64,
    pub total_issued: f64,
    pub announcement_date: NaiveDate,
}

impl PanelRow {
    /// Announced or auctioned but not yet issued as of this row's date.
    pub fn is_when_issued(&self) -> bool {
        self.date < self.first_issue_date
    }
}

/// Column order used by every panel export.
pub const PANEL_COLUMNS: [&str; 16] = [
    "date",
    "cusip",
    "securityType",
    "tenor",
    "vintage",
    "coupon",
    "maturityDate",
    "isTIPS",
    "isFloatingRate",
    "firstIssueDate",
    "issuanceType",
    "auctionDate",
    "unscheduledReopeningDate",
    "amountIssued",
    "totalIssued",
    "announcementDate",
];
