//! Tenor classification from original term to maturity.
//!
//! Each CUSIP's term is measured from its first issuance: the earliest issue
//! date and the maturity recorded on that issuance. Reopenings inherit the
//! term of the original issue, except unscheduled reopenings (a reopening
//! announced against another identifier), whose term runs from their own
//! issue date.
//!
//! Terms map onto inclusive day bands. Bills are bucketed in weeks, notes
//! and bonds in years of 365.25 days with a tolerance that widens with the
//! nominal tenor. The first matching band wins; no match leaves the tenor
//! unknown.

use crate::domain::{AuctionRecord, ClassifiedAuction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DAYS_PER_YEAR: f64 = 365.25;

/// Unit a tenor bucket is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenorUnit {
    Weeks,
    Years,
}

/// An inclusive term-to-maturity band in days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenorBand {
    pub tenor: u16,
    pub unit: TenorUnit,
    pub min_days: f64,
    pub max_days: f64,
}

impl TenorBand {
    pub fn contains(&self, days: i64) -> bool {
        let d = days as f64;
        d >= self.min_days && d <= self.max_days
    }
}

macro_rules! weeks {
    ($tenor:expr, $min:expr, $max:expr) => {
        TenorBand {
            tenor: $tenor,
            unit: TenorUnit::Weeks,
            min_days: $min,
            max_days: $max,
        }
    };
}

macro_rules! years {
    ($tenor:expr, $tolerance:expr) => {
        TenorBand {
            tenor: $tenor,
            unit: TenorUnit::Years,
            min_days: $tenor as f64 * DAYS_PER_YEAR - $tolerance,
            max_days: $tenor as f64 * DAYS_PER_YEAR + $tolerance,
        }
    };
}

/// Bands in match order.
pub const TENOR_BANDS: [TenorBand; 17] = [
    weeks!(1, 6.0, 8.0),
    weeks!(2, 13.0, 15.0),
    weeks!(4, 26.0, 30.0),
    weeks!(8, 53.0, 59.0),
    weeks!(13, 86.0, 96.0),
    weeks!(17, 114.0, 124.0),
    weeks!(22, 149.0, 159.0),
    weeks!(26, 176.0, 188.0),
    weeks!(52, 357.0, 371.0),
    years!(2, 93.0),
    years!(3, 93.0),
    years!(4, 93.0),
    years!(5, 180.0),
    years!(7, 180.0),
    years!(10, 240.0),
    years!(20, 540.0),
    years!(30, 720.0),
];

/// Look up the band for a term in days.
pub fn classify_term(days: i64) -> Option<&'static TenorBand> {
    TENOR_BANDS.iter().find(|band| band.contains(days))
}

/// Classify every record by the term of its CUSIP's first issuance.
///
/// Output is ordered by CUSIP, then issue date; records sharing an issue
/// date keep their input order.
pub fn classify_auctions(records: Vec<AuctionRecord>) -> Vec<ClassifiedAuction> {
    let mut by_cusip: BTreeMap<String, Vec<AuctionRecord>> = BTreeMap::new();
    for record in records {
        by_cusip.entry(record.cusip.clone()).or_default().push(record);
    }

    let mut out = Vec::new();
    let mut gaps = 0usize;

    for (_, mut group) in by_cusip {
        group.sort_by_key(|r| r.issue_date);
        let first = &group[0];
        let earliest_issue = first.issue_date;
        let earliest_maturity = first.maturity_date;
        let group_term = days_between(earliest_issue, earliest_maturity);

        for record in group {
            let (term, unscheduled) = if record.is_unscheduled_reopening() {
                (
                    days_between(record.issue_date, earliest_maturity),
                    Some(record.issue_date),
                )
            } else {
                (group_term, None)
            };

            let tenor = classify_term(term).map(|band| band.tenor);
            if tenor.is_none() {
                gaps += 1;
            }

            out.push(ClassifiedAuction {
                record,
                tenor,
                unscheduled_reopening_date: unscheduled,
            });
        }
    }

    if gaps > 0 {
        tracing::debug!(records = gaps, "records matched no tenor band");
    }

    out
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
