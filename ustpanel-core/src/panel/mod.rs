//! CUSIP-date panel construction.
//!
//! Turns classified auction records into one row per (CUSIP, business date):
//!
//! 1. per-CUSIP timelines (calendar expansion, auction join, when-issued
//!    resolution, fills, cumulative issuance) built in parallel
//! 2. vintage ranking across CUSIPs once every timeline is complete
//! 3. a final deterministic sort
//!
//! The build is a pure function of the records and the supplied `today`.

pub mod fill;
pub mod timeline;
pub mod vintage;

use crate::domain::{AuctionRecord, ClassifiedAuction, PanelRow};
use crate::tenor::classify_auctions;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub use timeline::{expand_cusip, is_weekend};
pub use vintage::assign_vintages;

/// Builds the panel as of a fixed reference date.
#[derive(Debug, Clone, Copy)]
pub struct PanelBuilder {
    today: NaiveDate,
}

impl PanelBuilder {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Build the sorted panel from classified auctions.
    pub fn build(&self, auctions: &[ClassifiedAuction]) -> Vec<PanelRow> {
        let mut by_cusip: BTreeMap<&str, Vec<&ClassifiedAuction>> = BTreeMap::new();
        for auction in auctions {
            by_cusip
                .entry(auction.record.cusip.as_str())
                .or_default()
                .push(auction);
        }
        for group in by_cusip.values_mut() {
            group.sort_by_key(|a| a.record.issue_date);
        }
        let cusips: Vec<(&str, Vec<&ClassifiedAuction>)> = by_cusip.into_iter().collect();

        let today = self.today;
        let timelines: Vec<Vec<PanelRow>> = cusips
            .par_iter()
            .filter_map(|(cusip, group)| expand_cusip(cusip, group, today))
            .collect();
        let skipped = cusips.len() - timelines.len();

        let mut rows: Vec<PanelRow> = timelines.into_iter().flatten().collect();
        assign_vintages(&mut rows);
        rows.sort_by(panel_order);

        tracing::info!(
            cusips = cusips.len(),
            skipped,
            rows = rows.len(),
            %today,
            "built CUSIP panel"
        );
        rows
    }
}

/// Classify raw records and build the panel in one step.
pub fn build_panel(records: Vec<AuctionRecord>, today: NaiveDate) -> Vec<PanelRow> {
    let classified = classify_auctions(records);
    PanelBuilder::new(today).build(&classified)
}

/// Output order: floating-rate flag, TIPS flag, date (newest first),
/// security type (descending), tenor, vintage, then CUSIP.
pub fn panel_order(a: &PanelRow, b: &PanelRow) -> Ordering {
    a.is_floating_rate
        .cmp(&b.is_floating_rate)
        .then(a.is_tips.cmp(&b.is_tips))
        .then(b.date.cmp(&a.date))
        .then(b.security_type.cmp(&a.security_type))
        .then(a.tenor.cmp(&b.tenor))
        .then(a.vintage.cmp(&b.vintage))
        .then_with(|| a.cusip.cmp(&b.cusip))
}
