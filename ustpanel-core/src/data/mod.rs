//! Auction data: upstream fetch, normalization and caching

pub mod cache;
pub mod download;
pub mod fiscal;
pub mod normalize;
pub mod provider;
pub mod schema;

pub use cache::{AuctionStore, CacheMeta, MemoryStore, ParquetCache};
pub use download::{load_auctions, LoadedAuctions};
pub use fiscal::FiscalDataProvider;
pub use normalize::{normalize_records, RawAuction};
pub use provider::{AuctionProvider, DataError, DataSource, DateRange};
pub use schema::{AuctionSchema, SchemaError};
