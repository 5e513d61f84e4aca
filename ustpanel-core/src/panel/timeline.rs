//! Per-CUSIP timeline: dense calendar expansion, auction join, when-issued
//! resolution, attribute fills and cumulative issuance.
//!
//! Everything here is scoped to a single CUSIP's own date sequence, so
//! timelines can be built independently and in any order.

use super::fill::{fill_both, forward_fill};
use crate::domain::{ClassifiedAuction, IssuanceType, PanelRow, SecurityType};
use chrono::{Datelike, NaiveDate, Weekday};

/// One calendar day of a CUSIP before attributes are resolved.
#[derive(Debug, Clone)]
struct Slot {
    date: NaiveDate,
    amount: Option<f64>,
    issuance_type: Option<IssuanceType>,
    unscheduled_reopening_date: Option<NaiveDate>,
    tenor: Option<u16>,
    coupon: Option<f64>,
    maturity_date: Option<NaiveDate>,
    announcement_date: Option<NaiveDate>,
    auction_date: Option<NaiveDate>,
    first_issue_date: Option<NaiveDate>,
    is_tips: Option<bool>,
    is_floating_rate: Option<bool>,
    security_type: Option<SecurityType>,
    joined: bool,
}

impl Slot {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            amount: None,
            issuance_type: None,
            unscheduled_reopening_date: None,
            tenor: None,
            coupon: None,
            maturity_date: None,
            announcement_date: None,
            auction_date: None,
            first_issue_date: None,
            is_tips: None,
            is_floating_rate: None,
            security_type: None,
            joined: false,
        }
    }

    /// Copy one auction's fields into this slot.
    fn join(&mut self, auction: &ClassifiedAuction, first_issue_date: NaiveDate) {
        let record = &auction.record;
        self.issuance_type = Some(record.issuance_type());
        self.unscheduled_reopening_date = auction.unscheduled_reopening_date;
        self.tenor = auction.tenor;
        self.coupon = record.interest_rate;
        self.maturity_date = Some(record.maturity_date);
        self.announcement_date = Some(record.announcement_date);
        self.auction_date = Some(record.auction_date);
        self.first_issue_date = Some(first_issue_date);
        self.is_tips = Some(record.is_inflation_indexed);
        self.is_floating_rate = Some(record.is_floating_rate);
        self.security_type = Some(record.security_type);
        self.joined = true;
    }

    /// Resolve into a panel row. `None` if a required attribute never became known.
    fn resolve(self, cusip: &str, amount_issued: f64, total_issued: f64) -> Option<PanelRow> {
        Some(PanelRow {
            date: self.date,
            cusip: cusip.to_string(),
            security_type: self.security_type?,
            tenor: self.tenor,
            vintage: 0,
            coupon: self.coupon,
            maturity_date: self.maturity_date?,
            is_tips: self.is_tips?,
            is_floating_rate: self.is_floating_rate?,
            first_issue_date: self.first_issue_date?,
            issuance_type: self.issuance_type,
            auction_date: self.auction_date?,
            unscheduled_reopening_date: self.unscheduled_reopening_date,
            amount_issued,
            total_issued,
            announcement_date: self.announcement_date?,
        })
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Build the weekday rows of one CUSIP. `vintage` is ranked later, across CUSIPs.
///
/// `auctions` must all belong to `cusip` and be sorted by issue date.
/// Returns `None` when no auction lands inside the CUSIP's own span, in
/// which case its attributes cannot be resolved.
pub fn expand_cusip(
    cusip: &str,
    auctions: &[&ClassifiedAuction],
    today: NaiveDate,
) -> Option<Vec<PanelRow>> {
    let first = auctions.first()?;
    let first_issue_date = first.record.issue_date;
    let start = auctions.iter().map(|a| a.record.announcement_date).min()?;
    let end = first.record.maturity_date.min(today);

    if start > end {
        return Some(Vec::new());
    }

    let mut slots: Vec<Slot> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(Slot::empty)
        .collect();
    let slot_index = |date: NaiveDate| -> Option<usize> {
        if date < start || date > end {
            None
        } else {
            usize::try_from((date - start).num_days()).ok()
        }
    };

    let (issued, pending): (Vec<&ClassifiedAuction>, Vec<&ClassifiedAuction>) = auctions
        .iter()
        .copied()
        .partition(|a| a.record.issue_date <= today);

    // Records sharing an issue date collapse into one slot: the first record
    // supplies the attributes and the accepted amounts add up.
    for same_day in issued.chunk_by(|a, b| a.record.issue_date == b.record.issue_date) {
        let Some(idx) = slot_index(same_day[0].record.issue_date) else {
            continue;
        };
        let slot = &mut slots[idx];
        slot.join(same_day[0], first_issue_date);
        slot.amount = same_day
            .iter()
            .filter_map(|a| a.record.total_accepted)
            .fold(None, |acc: Option<f64>, v| Some(acc.unwrap_or(0.0) + v));
    }

    // A pending issuance becomes visible today unless an issuance already
    // lands on today.
    let issued_today = issued.iter().any(|a| a.record.issue_date == today);
    if !issued_today {
        if let (Some(next), Some(idx)) = (pending.first(), slot_index(today)) {
            let slot = &mut slots[idx];
            slot.join(next, first_issue_date);
            slot.amount = Some(0.0);
            slot.issuance_type = None;
            slot.unscheduled_reopening_date = None;
        }
    }

    if !slots.iter().any(|s| s.joined) {
        tracing::warn!(cusip, "no auction falls inside the CUSIP's span; skipping");
        return None;
    }

    fill_both(&mut slots, |s| &mut s.tenor);
    fill_both(&mut slots, |s| &mut s.coupon);
    fill_both(&mut slots, |s| &mut s.maturity_date);
    fill_both(&mut slots, |s| &mut s.announcement_date);
    fill_both(&mut slots, |s| &mut s.auction_date);
    fill_both(&mut slots, |s| &mut s.first_issue_date);
    fill_both(&mut slots, |s| &mut s.is_tips);
    fill_both(&mut slots, |s| &mut s.is_floating_rate);
    fill_both(&mut slots, |s| &mut s.security_type);
    // Marks a state from the reopening onward, never retroactively.
    forward_fill(&mut slots, |s| &mut s.unscheduled_reopening_date);

    let mut total_issued = 0.0;
    let mut rows = Vec::with_capacity(slots.len() * 5 / 7 + 1);
    for slot in slots {
        let amount_issued = if slot.date < first_issue_date {
            0.0
        } else {
            slot.amount.unwrap_or(0.0)
        };
        total_issued += amount_issued;

        // Weekend rows only feed the running total; vintage groups are keyed
        // by date, so removing them before ranking changes nothing.
        if is_weekend(slot.date) {
            continue;
        }
        rows.push(slot.resolve(cusip, amount_issued, total_issued)?);
    }

    Some(rows)
}
