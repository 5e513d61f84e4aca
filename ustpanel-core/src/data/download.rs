//! Load orchestrator: cache first, upstream on a miss, store on success.

use super::cache::AuctionStore;
use super::provider::{AuctionProvider, DataError, DataSource, DateRange};
use crate::domain::AuctionRecord;

/// Auction history ready for classification.
#[derive(Debug, Clone)]
pub struct LoadedAuctions {
    pub records: Vec<AuctionRecord>,
    pub source: DataSource,
    pub range: DateRange,
}

/// Load the auction history for `range`.
///
/// A cache hit is returned unless `force` is set. A fetched history is
/// written back to the store; a failed fetch writes nothing.
pub fn load_auctions(
    provider: &dyn AuctionProvider,
    store: &dyn AuctionStore,
    range: DateRange,
    force: bool,
) -> Result<LoadedAuctions, DataError> {
    if !force {
        if let Some(records) = store.get(range)? {
            return Ok(LoadedAuctions {
                records,
                source: DataSource::Cache,
                range,
            });
        }
    }

    tracing::info!(provider = provider.name(), %range, force, "fetching auction history");
    let records = provider.fetch(range)?;
    store.put(range, &records)?;

    Ok(LoadedAuctions {
        records,
        source: DataSource::FiscalData,
        range,
    })
}
