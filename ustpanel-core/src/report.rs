//! Summary statistics over a finished panel.
//!
//! Read-only: nothing here feeds back into panel construction.

use crate::domain::PanelRow;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Per-tenor statistics for one family (bills, or notes and bonds).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenorStats {
    pub tenor: u16,
    pub unique_cusips: usize,
    /// Mean over dates of the number of distinct vintages observed that day.
    pub avg_daily_vintages: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSummary {
    pub observations: usize,
    pub unique_cusips: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub bills: Vec<TenorStats>,
    pub coupons: Vec<TenorStats>,
}

#[derive(Default)]
struct TenorAccumulator<'a> {
    cusips: HashSet<&'a str>,
    vintages_by_date: BTreeMap<NaiveDate, BTreeSet<i32>>,
}

impl TenorAccumulator<'_> {
    fn finish(self, tenor: u16) -> TenorStats {
        let days = self.vintages_by_date.len();
        let total: usize = self.vintages_by_date.values().map(BTreeSet::len).sum();
        TenorStats {
            tenor,
            unique_cusips: self.cusips.len(),
            avg_daily_vintages: if days == 0 {
                0.0
            } else {
                total as f64 / days as f64
            },
        }
    }
}

impl PanelSummary {
    pub fn from_rows(rows: &[PanelRow]) -> Self {
        let mut bills: BTreeMap<u16, TenorAccumulator> = BTreeMap::new();
        let mut coupons: BTreeMap<u16, TenorAccumulator> = BTreeMap::new();
        let mut cusips: HashSet<&str> = HashSet::new();

        for row in rows {
            cusips.insert(row.cusip.as_str());
            let Some(tenor) = row.tenor else { continue };
            let family = if row.security_type.is_bill() {
                &mut bills
            } else {
                &mut coupons
            };
            let acc = family.entry(tenor).or_default();
            acc.cusips.insert(row.cusip.as_str());
            acc.vintages_by_date
                .entry(row.date)
                .or_default()
                .insert(row.vintage);
        }

        Self {
            observations: rows.len(),
            unique_cusips: cusips.len(),
            first_date: rows.iter().map(|r| r.date).min(),
            last_date: rows.iter().map(|r| r.date).max(),
            bills: finish_family(bills),
            coupons: finish_family(coupons),
        }
    }
}

fn finish_family(family: BTreeMap<u16, TenorAccumulator<'_>>) -> Vec<TenorStats> {
    family
        .into_iter()
        .map(|(tenor, acc)| acc.finish(tenor))
        .collect()
}

/// `1234567` → `1,234,567`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn section(f: &mut fmt::Formatter<'_>, rule: &str, title: &str) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{rule}")?;
    writeln!(f, "{title}")?;
    writeln!(f, "{rule}")
}

impl fmt::Display for PanelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(70);

        section(f, &rule, "Data Statistics Summary")?;
        writeln!(f, "Total observations: {}", thousands(self.observations))?;
        writeln!(f, "Unique CUSIPs: {}", thousands(self.unique_cusips))?;
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => writeln!(f, "Date range: {first} to {last}")?,
            _ => writeln!(f, "Date range: (empty panel)")?,
        }

        section(f, &rule, "Bill Statistics (by tenor in weeks)")?;
        for s in &self.bills {
            writeln!(
                f,
                "{}-week: {} unique CUSIPs, {:.0} avg daily vintages",
                s.tenor,
                thousands(s.unique_cusips),
                s.avg_daily_vintages
            )?;
        }

        section(f, &rule, "Note/Bond Statistics (by tenor in years)")?;
        for s in &self.coupons {
            writeln!(
                f,
                "{}-year: {} unique CUSIPs, {:.0} avg daily vintages",
                s.tenor,
                thousands(s.unique_cusips),
                s.avg_daily_vintages
            )?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SecurityType;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(
        cusip: &str,
        date: &str,
        kind: SecurityType,
        tenor: Option<u16>,
        vintage: i32,
    ) -> PanelRow {
        PanelRow {
            date: d(date),
            cusip: cusip.into(),
            security_type: kind,
            tenor,
            vintage,
            coupon: None,
            maturity_date: d("2030-01-01"),
            is_tips: false,
            is_floating_rate: false,
            first_issue_date: d("2024-01-02"),
            issuance_type: None,
            auction_date: d("2024-01-02"),
            unscheduled_reopening_date: None,
            amount_issued: 0.0,
            total_issued: 0.0,
            announcement_date: d("2024-01-02"),
        }
    }

    #[test]
    fn counts_observations_and_cusips() {
        let rows = vec![
            row("A", "2024-01-02", SecurityType::Bill, Some(4), 0),
            row("A", "2024-01-03", SecurityType::Bill, Some(4), 0),
            row("B", "2024-01-03", SecurityType::Bill, Some(4), 1),
            row("N", "2024-01-03", SecurityType::Note, Some(10), 0),
            row("X", "2024-01-04", SecurityType::Note, None, 0),
        ];
        let summary = PanelSummary::from_rows(&rows);

        assert_eq!(summary.observations, 5);
        assert_eq!(summary.unique_cusips, 4);
        assert_eq!(summary.first_date, Some(d("2024-01-02")));
        assert_eq!(summary.last_date, Some(d("2024-01-04")));

        assert_eq!(summary.bills.len(), 1);
        assert_eq!(summary.bills[0].tenor, 4);
        assert_eq!(summary.bills[0].unique_cusips, 2);
        // One vintage on the 2nd, two on the 3rd.
        assert!((summary.bills[0].avg_daily_vintages - 1.5).abs() < 1e-12);

        assert_eq!(summary.coupons.len(), 1);
        assert_eq!(summary.coupons[0].tenor, 10);
    }

    #[test]
    fn empty_panel_summarizes() {
        let summary = PanelSummary::from_rows(&[]);
        assert_eq!(summary.observations, 0);
        assert!(summary.bills.is_empty());
        assert!(summary.to_string().contains("(empty panel)"));
    }

    #[test]
    fn display_uses_thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");

        let rows = vec![row("A", "2024-01-02", SecurityType::Bill, Some(4), 0)];
        let text = PanelSummary::from_rows(&rows).to_string();
        assert!(text.contains("Total observations: 1"));
        assert!(text.contains("4-week: 1 unique CUSIPs, 1 avg daily vintages"));
    }
}
