//! Property tests for panel invariants.
//!
//! Uses proptest to verify, over randomly generated auction histories:
//! 1. Exactly one row per (CUSIP, business day) in each CUSIP's span
//! 2. Cumulative issuance never decreases and is zero before first issue
//! 3. Conservation: issued amounts add up to the accepted amounts
//! 4. Vintages are dense within every peer group, unknown tenors included,
//!    and start at -1 exactly when the group has a when-issued member
//! 5. Determinism: rebuilding, or reordering the input, gives the same hash
//! 6. Tenor bands never overlap

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use ustpanel_core::domain::{AuctionRecord, PanelRow, SecurityType};
use ustpanel_core::fingerprint::panel_hash;
use ustpanel_core::panel::panel_order;
use ustpanel_core::tenor::{classify_term, TENOR_BANDS};
use ustpanel_core::build_panel;

// ── Strategies (proptest) ────────────────────────────────────────────

/// A Tuesday; every generated issue date is this plus whole weeks.
fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

/// One generated security: a 4-week bill, a 42-day bill that matches no
/// tenor band, or a 2-year note (nominal, TIPS or FRN).
#[derive(Debug, Clone)]
struct SyntheticCusip {
    term_days: i64,
    first_week: i64,
    reopen_weeks: Vec<i64>,
    amounts: Vec<u32>,
    is_tips: bool,
    is_floating_rate: bool,
    /// The last reopening is announced under another CUSIP.
    unscheduled: bool,
}

impl SyntheticCusip {
    fn is_bill(&self) -> bool {
        self.term_days < 365
    }

    fn first_issue(&self) -> NaiveDate {
        base() + Duration::weeks(self.first_week)
    }

    fn maturity(&self) -> NaiveDate {
        self.first_issue() + Duration::days(self.term_days)
    }

    fn records(&self, cusip: &str) -> Vec<AuctionRecord> {
        let first_issue = self.first_issue();
        let mut weeks = self.reopen_weeks.clone();
        weeks.sort_unstable();
        weeks.dedup();
        let last_reopen = weeks.last().copied();

        std::iter::once(0)
            .chain(weeks)
            .zip(self.amounts.iter().copied().chain(std::iter::repeat(1)))
            .map(|(week, amount)| {
                let issue = first_issue + Duration::weeks(week);
                let unscheduled = self.unscheduled && week > 0 && Some(week) == last_reopen;
                AuctionRecord {
                    cusip: cusip.to_string(),
                    security_type: if self.is_bill() {
                        SecurityType::Bill
                    } else {
                        SecurityType::Note
                    },
                    issue_date: issue,
                    original_issue_date: (week > 0).then_some(first_issue),
                    maturity_date: self.maturity(),
                    interest_rate: (!self.is_bill() && !self.is_floating_rate).then_some(4.25),
                    total_accepted: Some(f64::from(amount) * 1000.0),
                    is_reopening: week > 0,
                    is_inflation_indexed: self.is_tips,
                    is_floating_rate: self.is_floating_rate,
                    announcement_date: issue - Duration::days(5),
                    announced_cusip: unscheduled.then(|| format!("X{cusip}")),
                    auction_date: issue - Duration::days(2),
                }
            })
            .collect()
    }
}

fn arb_cusip() -> impl Strategy<Value = SyntheticCusip> {
    prop_oneof![Just(28i64), Just(42i64), Just(731i64)].prop_flat_map(|term_days| {
        // Reopenings stay strictly before maturity.
        let max_reopen = ((term_days - 1) / 7).min(20);
        (
            0i64..20,
            prop::collection::vec(1i64..=max_reopen, 0..3),
            prop::collection::vec(1u32..500, 3),
            0u8..3,
            any::<bool>(),
        )
            .prop_map(
                move |(first_week, reopen_weeks, amounts, flavor, unscheduled)| SyntheticCusip {
                    term_days,
                    first_week,
                    reopen_weeks,
                    amounts,
                    is_tips: term_days > 365 && flavor == 1,
                    is_floating_rate: term_days > 365 && flavor == 2,
                    unscheduled,
                },
            )
    })
}

/// Any weekday within ~30 weeks of the base date.
fn arb_today() -> impl Strategy<Value = NaiveDate> {
    (0i64..210).prop_map(|offset| {
        let date = base() + Duration::days(offset);
        match date.weekday() {
            Weekday::Sat => date + Duration::days(2),
            Weekday::Sun => date + Duration::days(1),
            _ => date,
        }
    })
}

fn arb_history() -> impl Strategy<Value = (Vec<SyntheticCusip>, NaiveDate)> {
    (prop::collection::vec(arb_cusip(), 1..6), arb_today())
}

fn cusip_name(i: usize) -> String {
    format!("C{i:03}")
}

fn build(history: &[SyntheticCusip], today: NaiveDate) -> (Vec<AuctionRecord>, Vec<PanelRow>) {
    let records: Vec<AuctionRecord> = history
        .iter()
        .enumerate()
        .flat_map(|(i, synth)| synth.records(&cusip_name(i)))
        .collect();
    let panel = build_panel(records.clone(), today);
    (records, panel)
}

fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn by_cusip(panel: &[PanelRow]) -> BTreeMap<&str, Vec<&PanelRow>> {
    let mut out: BTreeMap<&str, Vec<&PanelRow>> = BTreeMap::new();
    for row in panel {
        out.entry(row.cusip.as_str()).or_default().push(row);
    }
    for rows in out.values_mut() {
        rows.sort_by_key(|r| r.date);
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ── 1. Dense business-day coverage ───────────────────────────────

    #[test]
    fn one_row_per_business_day_in_span((history, today) in arb_history()) {
        let (_, panel) = build(&history, today);
        let grouped = by_cusip(&panel);

        for (i, synth) in history.iter().enumerate() {
            let name = cusip_name(i);
            let start = synth.first_issue() - Duration::days(5);
            let end = synth.maturity().min(today);
            let expected: Vec<NaiveDate> = start
                .iter_days()
                .take_while(|d| *d <= end)
                .filter(|d| is_weekday(*d))
                .collect();
            let actual: Vec<NaiveDate> = grouped
                .get(name.as_str())
                .map(|rows| rows.iter().map(|r| r.date).collect())
                .unwrap_or_default();
            prop_assert_eq!(actual, expected, "cusip {}", name);
        }
        prop_assert!(panel.iter().all(|r| is_weekday(r.date)));
    }

    // ── 2. Cumulative issuance ───────────────────────────────────────

    #[test]
    fn total_issued_is_monotone_and_zero_before_issue((history, today) in arb_history()) {
        let (_, panel) = build(&history, today);
        for rows in by_cusip(&panel).values() {
            for pair in rows.windows(2) {
                prop_assert!(pair[1].total_issued >= pair[0].total_issued);
            }
            for row in rows {
                if row.date < row.first_issue_date {
                    prop_assert_eq!(row.amount_issued, 0.0);
                    prop_assert_eq!(row.total_issued, 0.0);
                }
            }
        }
    }

    // ── 3. Conservation ──────────────────────────────────────────────

    #[test]
    fn issued_amounts_add_up((history, today) in arb_history()) {
        let (records, panel) = build(&history, today);
        let grouped = by_cusip(&panel);

        for (i, synth) in history.iter().enumerate() {
            let name = cusip_name(i);
            let horizon = synth.maturity().min(today);
            let accepted: f64 = records
                .iter()
                .filter(|r| r.cusip == name && r.issue_date <= horizon)
                .filter_map(|r| r.total_accepted)
                .sum();
            let rows = grouped.get(name.as_str()).cloned().unwrap_or_default();
            let issued: f64 = rows.iter().map(|r| r.amount_issued).sum();
            prop_assert_eq!(issued, accepted, "cusip {}", name);
            if let Some(last) = rows.last() {
                prop_assert_eq!(last.total_issued, accepted);
            }
        }
    }

    // ── 4. Dense vintages ────────────────────────────────────────────

    #[test]
    fn vintages_are_dense_in_every_peer_group((history, today) in arb_history()) {
        let (_, panel) = build(&history, today);
        type Peers = (NaiveDate, SecurityType, bool, bool, Option<u16>);
        let mut groups: BTreeMap<Peers, Vec<&PanelRow>> = BTreeMap::new();
        for row in &panel {
            groups
                .entry((row.date, row.security_type, row.is_tips, row.is_floating_rate, row.tenor))
                .or_default()
                .push(row);
        }

        for members in groups.values() {
            let vintages: BTreeSet<i32> = members.iter().map(|r| r.vintage).collect();
            let distinct_issues: BTreeSet<NaiveDate> =
                members.iter().map(|r| r.first_issue_date).collect();
            let offset = if members.iter().any(|r| r.is_when_issued()) { -1 } else { 0 };
            let expected: BTreeSet<i32> =
                (0..distinct_issues.len() as i32).map(|v| v + offset).collect();
            prop_assert_eq!(vintages, expected);
        }
    }

    // ── 5. Determinism ───────────────────────────────────────────────

    #[test]
    fn rebuild_and_reorder_give_same_hash((history, today) in arb_history()) {
        let (records, panel) = build(&history, today);
        let again = build_panel(records.clone(), today);
        prop_assert_eq!(panel_hash(&panel), panel_hash(&again));

        let mut reversed = records;
        reversed.reverse();
        let reordered = build_panel(reversed, today);
        prop_assert_eq!(panel_hash(&panel), panel_hash(&reordered));
    }

    #[test]
    fn output_is_sorted((history, today) in arb_history()) {
        let (_, panel) = build(&history, today);
        for pair in panel.windows(2) {
            prop_assert_ne!(panel_order(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    // ── 6. Tenor bands ───────────────────────────────────────────────

    #[test]
    fn a_term_matches_at_most_one_band(days in 0i64..12_000) {
        let matches = TENOR_BANDS.iter().filter(|b| b.contains(days)).count();
        prop_assert!(matches <= 1);
        prop_assert_eq!(classify_term(days).is_some(), matches == 1);
    }
}
