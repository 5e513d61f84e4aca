//! Vintage ranking across CUSIPs.
//!
//! Peers share a date, security type, TIPS flag, floating-rate flag and
//! tenor. Within a peer group the most recently first-issued CUSIP is
//! vintage 0. When a group contains a when-issued CUSIP every vintage drops
//! by one, so the pending security takes −1 and the on-the-run issue keeps 0.
//!
//! An unknown tenor is a group key of its own: unclassified CUSIPs rank
//! among themselves and never shift classified peers.

use crate::domain::{PanelRow, SecurityType};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PeerGroup {
    date: NaiveDate,
    security_type: SecurityType,
    is_tips: bool,
    is_floating_rate: bool,
    tenor: Option<u16>,
}

impl PeerGroup {
    fn of(row: &PanelRow) -> Self {
        Self {
            date: row.date,
            security_type: row.security_type,
            is_tips: row.is_tips,
            is_floating_rate: row.is_floating_rate,
            tenor: row.tenor,
        }
    }
}

/// Assign `vintage` on every row.
pub fn assign_vintages(rows: &mut [PanelRow]) {
    let mut groups: HashMap<PeerGroup, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups.entry(PeerGroup::of(row)).or_default().push(i);
    }

    for members in groups.values() {
        // Distinct first-issue dates, most recent first: position = dense rank.
        let mut issued: Vec<NaiveDate> = members.iter().map(|&i| rows[i].first_issue_date).collect();
        issued.sort_unstable_by(|a, b| b.cmp(a));
        issued.dedup();

        let shift = i32::from(members.iter().any(|&i| rows[i].is_when_issued()));

        for &i in members {
            let target = rows[i].first_issue_date;
            let rank = issued
                .binary_search_by(|probe| target.cmp(probe))
                .unwrap_or_else(|pos| pos);
            rows[i].vintage = rank as i32 - shift;
        }
    }
}
