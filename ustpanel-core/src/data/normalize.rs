//! Wire records to domain records.
//!
//! The Fiscal Data API returns every field as a string and marks absent
//! values with the literal `"null"`. This module is the only place that
//! sentinel is recognized: past it, absence is `None`.

use super::schema::SchemaError;
use crate::domain::{AuctionRecord, SecurityType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One auction record exactly as the upstream API returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAuction {
    pub cusip: Option<String>,
    pub security_type: Option<String>,
    pub issue_date: Option<String>,
    pub original_issue_date: Option<String>,
    pub maturity_date: Option<String>,
    pub int_rate: Option<String>,
    pub total_accepted: Option<String>,
    pub reopening: Option<String>,
    pub inflation_index_security: Option<String>,
    pub floating_rate: Option<String>,
    pub announcemt_date: Option<String>,
    pub announcemtd_cusip: Option<String>,
    pub auction_date: Option<String>,
}

/// `"null"`, empty and whitespace-only strings are absence.
pub fn normalize_sentinel(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

impl RawAuction {
    /// Convert to a domain record, failing on missing or malformed identity
    /// and date fields.
    pub fn into_record(self) -> Result<AuctionRecord, SchemaError> {
        let cusip = normalize_sentinel(self.cusip).ok_or_else(|| SchemaError::MissingField {
            field: "cusip",
            cusip: "?".into(),
        })?;

        let security_type = required("security_type", &cusip, self.security_type)?;
        let security_type =
            security_type
                .parse::<SecurityType>()
                .map_err(|reason| SchemaError::InvalidField {
                    field: "security_type",
                    value: security_type.clone(),
                    reason,
                })?;

        let issue_date = required_date("issue_date", &cusip, self.issue_date)?;
        let maturity_date = required_date("maturity_date", &cusip, self.maturity_date)?;
        let announcement_date = required_date("announcemt_date", &cusip, self.announcemt_date)?;
        let auction_date = required_date("auction_date", &cusip, self.auction_date)?;
        let original_issue_date = optional_date("original_issue_date", self.original_issue_date)?;

        Ok(AuctionRecord {
            interest_rate: optional_number("int_rate", &cusip, self.int_rate),
            total_accepted: optional_number("total_accepted", &cusip, self.total_accepted),
            is_reopening: yes_no(self.reopening),
            is_inflation_indexed: yes_no(self.inflation_index_security),
            is_floating_rate: yes_no(self.floating_rate),
            announced_cusip: normalize_sentinel(self.announcemtd_cusip),
            cusip,
            security_type,
            issue_date,
            original_issue_date,
            maturity_date,
            announcement_date,
            auction_date,
        })
    }
}

/// Normalize a batch, stopping at the first structural error.
pub fn normalize_records(raw: Vec<RawAuction>) -> Result<Vec<AuctionRecord>, SchemaError> {
    raw.into_iter().map(RawAuction::into_record).collect()
}

fn required(
    field: &'static str,
    cusip: &str,
    value: Option<String>,
) -> Result<String, SchemaError> {
    normalize_sentinel(value).ok_or_else(|| SchemaError::MissingField {
        field,
        cusip: cusip.to_string(),
    })
}

fn parse_date(field: &'static str, value: String) -> Result<NaiveDate, SchemaError> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| SchemaError::InvalidField {
        field,
        reason: e.to_string(),
        value,
    })
}

fn required_date(
    field: &'static str,
    cusip: &str,
    value: Option<String>,
) -> Result<NaiveDate, SchemaError> {
    parse_date(field, required(field, cusip, value)?)
}

fn optional_date(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, SchemaError> {
    normalize_sentinel(value)
        .map(|v| parse_date(field, v))
        .transpose()
}

/// Unparseable amounts and rates become absent, as they carry no identity.
fn optional_number(field: &'static str, cusip: &str, value: Option<String>) -> Option<f64> {
    let value = normalize_sentinel(value)?;
    match value.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::warn!(cusip, field, value = %value, "unparseable number treated as absent");
            None
        }
    }
}

fn yes_no(value: Option<String>) -> bool {
    normalize_sentinel(value).is_some_and(|v| v.eq_ignore_ascii_case("yes"))
}
