//! Treasury Fiscal Data auctions provider.
//!
//! Pages through the `auctions_query` endpoint, filtered on auction date.
//! There are no retries: any non-success page fails the whole fetch so a
//! partial history is never mistaken for a complete one.

use super::normalize::{normalize_records, RawAuction};
use super::provider::{AuctionProvider, DataError, DateRange};
use crate::domain::AuctionRecord;
use serde::Deserialize;
use std::time::Duration;

pub const API_BASE_URL: &str =
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service/v1/accounting/od/auctions_query";

/// Largest page the API will serve.
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Fields requested from the API. Anything else is ignored.
pub const REQUIRED_FIELDS: [&str; 13] = [
    "cusip",
    "security_type",
    "issue_date",
    "original_issue_date",
    "maturity_date",
    "int_rate",
    "total_accepted",
    "reopening",
    "inflation_index_security",
    "floating_rate",
    "announcemt_date",
    "announcemtd_cusip",
    "auction_date",
];

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    data: Vec<RawAuction>,
}

/// Fiscal Data API provider.
pub struct FiscalDataProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    page_size: u32,
}

impl FiscalDataProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_endpoint(API_BASE_URL, DEFAULT_PAGE_SIZE)
    }

    /// Provider against a custom endpoint (mirrors, test servers).
    pub fn with_endpoint(base_url: &str, page_size: u32) -> Result<Self, DataError> {
        if page_size == 0 {
            return Err(DataError::ValidationError("page size must be positive".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("ustpanel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            page_size,
        })
    }

    /// The `filter` query value for an auction-date window.
    pub fn filter_param(range: DateRange) -> String {
        format!(
            "auction_date:gte:{},auction_date:lte:{}",
            range.start, range.end
        )
    }

    fn fetch_page(&self, range: DateRange, page: u32) -> Result<Vec<RawAuction>, DataError> {
        let fields = REQUIRED_FIELDS.join(",");
        let filter = Self::filter_param(range);
        let page_number = page.to_string();
        let page_size = self.page_size.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("fields", fields.as_str()),
                ("filter", filter.as_str()),
                ("format", "json"),
                ("page[number]", page_number.as_str()),
                ("page[size]", page_size.as_str()),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::UpstreamFetch {
                page,
                status: status.as_u16(),
            });
        }

        let body: PageResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse page {page}: {e}"))
        })?;
        Ok(body.data)
    }
}

/// Drive pagination from page 1 until an empty or short page.
pub fn fetch_all_pages<F>(page_size: u32, mut fetch_page: F) -> Result<Vec<RawAuction>, DataError>
where
    F: FnMut(u32) -> Result<Vec<RawAuction>, DataError>,
{
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let batch = fetch_page(page)?;
        let len = batch.len();
        tracing::info!(page, records = len, "retrieved auctions page");
        all.extend(batch);
        if len < page_size as usize {
            break;
        }
        page += 1;
    }
    Ok(all)
}

impl AuctionProvider for FiscalDataProvider {
    fn name(&self) -> &str {
        "fiscal_data"
    }

    fn fetch(&self, range: DateRange) -> Result<Vec<AuctionRecord>, DataError> {
        let raw = fetch_all_pages(self.page_size, |page| self.fetch_page(range, page))?;
        tracing::info!(records = raw.len(), %range, "downloaded auction history");
        Ok(normalize_records(raw)?)
    }
}
