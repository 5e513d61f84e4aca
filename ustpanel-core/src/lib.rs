//! ustpanel core: Treasury auction records to a dense CUSIP-date panel.
//!
//! This crate contains:
//! - Domain types (auction records, classified auctions, panel rows)
//! - Tenor classification from term to maturity
//! - Panel construction: calendar expansion, when-issued resolution,
//!   attribute fills, cumulative issuance, vintage ranking
//! - Data access: Fiscal Data API provider, Parquet cache, load orchestration
//! - Export (CSV, Parquet), summary reporting and panel fingerprints
//!
//! Panel construction is a pure function of the records and an explicit
//! `today`; nothing below `data` touches the network, the disk or the clock.

pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod fingerprint;
pub mod panel;
pub mod report;
pub mod tenor;

pub use config::{ConfigError, PanelConfig};
pub use domain::{AuctionRecord, ClassifiedAuction, PanelRow};
pub use panel::{build_panel, PanelBuilder};
pub use tenor::classify_auctions;
