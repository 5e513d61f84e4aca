//! Panel fingerprinting: deterministic identification of a built panel.
//!
//! Two builds from the same auction records and the same `today` must give
//! the same digest. The CLI logs it so reruns can be compared at a glance.

use crate::domain::PanelRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// BLAKE3 hex digest of the JSON-serialized rows, in panel order.
pub fn panel_hash(rows: &[PanelRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        let bytes = serde_json::to_vec(row).expect("PanelRow must serialize");
        hasher.update(&bytes);
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

/// Identity of one panel build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelFingerprint {
    pub today: NaiveDate,
    pub row_count: usize,
    pub panel_hash: String,
}

impl PanelFingerprint {
    pub fn of(rows: &[PanelRow], today: NaiveDate) -> Self {
        Self {
            today,
            row_count: rows.len(),
            panel_hash: panel_hash(rows),
        }
    }
}
