//! AuctionRecord: one security's participation in one auction event.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marketable Treasury security type.
///
/// Variant order is the lexical order of the upstream labels
/// (`Bill < Bond < Note`), which the panel's final sort relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityType {
    Bill,
    Bond,
    Note,
}

impl SecurityType {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityType::Bill => "Bill",
            SecurityType::Bond => "Bond",
            SecurityType::Note => "Note",
        }
    }

    /// Bills carry week tenors; notes and bonds carry year tenors.
    pub fn is_bill(self) -> bool {
        matches!(self, SecurityType::Bill)
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bill" | "cmb" => Ok(SecurityType::Bill),
            "bond" => Ok(SecurityType::Bond),
            "note" => Ok(SecurityType::Note),
            other => Err(format!("unknown security type '{other}'")),
        }
    }
}

/// Whether an auction sold a new security or added to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssuanceType {
    Opening,
    #[serde(rename = "Re-opening")]
    Reopening,
}

impl IssuanceType {
    pub fn from_reopening(is_reopening: bool) -> Self {
        if is_reopening {
            IssuanceType::Reopening
        } else {
            IssuanceType::Opening
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssuanceType::Opening => "Opening",
            IssuanceType::Reopening => "Re-opening",
        }
    }
}

impl fmt::Display for IssuanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized auction record.
///
/// Upstream null sentinels have already been turned into `None`; identity
/// and date fields are guaranteed present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    pub cusip: String,
    pub security_type: SecurityType,
    pub issue_date: NaiveDate,
    pub original_issue_date: Option<NaiveDate>,
    pub maturity_date: NaiveDate,
    pub interest_rate: Option<f64>,
    pub total_accepted: Option<f64>,
    pub is_reopening: bool,
    pub is_inflation_indexed: bool,
    pub is_floating_rate: bool,
    pub announcement_date: NaiveDate,
    /// Differs from `cusip` when a security was reopened under a new identifier.
    pub announced_cusip: Option<String>,
    pub auction_date: NaiveDate,
}

impl AuctionRecord {
    pub fn issuance_type(&self) -> IssuanceType {
        IssuanceType::from_reopening(self.is_reopening)
    }

    /// A reopening announced against another identifier, outside the regular calendar.
    pub fn is_unscheduled_reopening(&self) -> bool {
        self.is_reopening && self.announced_cusip.is_some()
    }
}

/// An auction record after tenor classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedAuction {
    pub record: AuctionRecord,
    /// Weeks for bills, years for notes/bonds. `None` when no band matched.
    pub tenor: Option<u16>,
    pub unscheduled_reopening_date: Option<NaiveDate>,
}
