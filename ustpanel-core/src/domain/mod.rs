//! Domain types for the Treasury CUSIP panel

pub mod auction;
pub mod panel_row;

pub use auction::{AuctionRecord, ClassifiedAuction, IssuanceType, SecurityType};
pub use panel_row::{PanelRow, PANEL_COLUMNS};
