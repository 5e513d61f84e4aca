//! Auction provider trait and structured error types.
//!
//! The AuctionProvider trait abstracts over upstream sources (the Treasury
//! Fiscal Data API, fixtures in tests) so the fetch path can be swapped and
//! mocked. Providers know nothing about caching; see `cache::AuctionStore`.

use super::schema::SchemaError;
use crate::domain::AuctionRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Structured error types for data operations.
///
/// These are designed to be displayable in CLI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("upstream request failed on page {page}: HTTP {status}")]
    UpstreamFetch { page: u32, status: u16 },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Inclusive auction-date window. Also the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DataError> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Where the records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    FiscalData,
    Cache,
}

/// Trait for auction data providers.
///
/// Implementations retrieve every record whose auction date falls inside
/// the range, already normalized. A failed request fails the whole fetch.
pub trait AuctionProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch all auction records for an inclusive auction-date window.
    fn fetch(&self, range: DateRange) -> Result<Vec<AuctionRecord>, DataError>;
}
