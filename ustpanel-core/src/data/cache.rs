//! Parquet cache for normalized auction records.
//!
//! Layout: `{cache_dir}/auctions.parquet` plus a `meta.json` sidecar keyed on
//! the requested auction-date range.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - The sidecar is removed first and written last, so a crash mid-write
//!   leaves a miss rather than a stale hit
//! - Integrity validation on load (schema, record count, content hash)
//! - Quarantine for corrupt files (`auctions.parquet.quarantined`)

use super::provider::{DataError, DateRange};
use super::schema::AuctionSchema;
use crate::domain::{AuctionRecord, SecurityType};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DATA_FILE: &str = "auctions.parquet";
const META_FILE: &str = "meta.json";

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// Storage for fetched auction histories, keyed by request range.
pub trait AuctionStore: Send + Sync {
    /// Records cached for exactly this range, if any.
    fn get(&self, range: DateRange) -> Result<Option<Vec<AuctionRecord>>, DataError>;

    /// Replace the cached history with records fetched for `range`.
    fn put(&self, range: DateRange, records: &[AuctionRecord]) -> Result<(), DataError>;
}

/// Metadata sidecar for the cached history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub record_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

impl CacheMeta {
    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.start_date, self.end_date).ok()
    }
}

/// In-process store, used in tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<DateRange, Vec<AuctionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuctionStore for MemoryStore {
    fn get(&self, range: DateRange) -> Result<Option<Vec<AuctionRecord>>, DataError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| DataError::CacheError("memory store lock poisoned".into()))?;
        Ok(entries.get(&range).cloned())
    }

    fn put(&self, range: DateRange, records: &[AuctionRecord]) -> Result<(), DataError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DataError::CacheError("memory store lock poisoned".into()))?;
        entries.clear();
        entries.insert(range, records.to_vec());
        Ok(())
    }
}

/// The Parquet cache.
pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn data_path(&self) -> PathBuf {
        self.cache_dir.join(DATA_FILE)
    }

    fn meta_path(&self) -> PathBuf {
        self.cache_dir.join(META_FILE)
    }

    /// Sidecar of the current cache contents, if readable.
    pub fn get_meta(&self) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path()).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Remove the cached history. Returns whether anything was removed.
    pub fn clear(&self) -> Result<bool, DataError> {
        let mut removed = false;
        for path in [self.meta_path(), self.data_path()] {
            if path.exists() {
                fs::remove_file(&path)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", path.display())))?;
                removed = true;
            }
        }
        Ok(removed)
    }

    /// Move a corrupt data file aside and drop its sidecar.
    fn quarantine(&self, reason: &DataError) {
        let path = self.data_path();
        let quarantined = path.with_extension("parquet.quarantined");
        tracing::warn!(
            path = %path.display(),
            error = %reason,
            "quarantining corrupt cache file"
        );
        let _ = fs::rename(&path, &quarantined);
        let _ = fs::remove_file(self.meta_path());
    }
}

impl AuctionStore for ParquetCache {
    fn get(&self, range: DateRange) -> Result<Option<Vec<AuctionRecord>>, DataError> {
        let Some(meta) = self.get_meta() else {
            return Ok(None);
        };
        if meta.range() != Some(range) {
            tracing::info!(
                cached = %format_args!("{},{}", meta.start_date, meta.end_date),
                requested = %range,
                "cached range differs from request"
            );
            return Ok(None);
        }

        let loaded = load_and_validate_parquet(&self.data_path()).and_then(|records| {
            if records.len() != meta.record_count {
                return Err(DataError::ValidationError(format!(
                    "expected {} records, found {}",
                    meta.record_count,
                    records.len()
                )));
            }
            if records_hash(&records)? != meta.data_hash {
                return Err(DataError::ValidationError("content hash mismatch".into()));
            }
            Ok(records)
        });

        match loaded {
            Ok(records) => {
                tracing::info!(records = records.len(), %range, "loaded auctions from cache");
                Ok(Some(records))
            }
            Err(e) => {
                self.quarantine(&e);
                Ok(None)
            }
        }
    }

    fn put(&self, range: DateRange, records: &[AuctionRecord]) -> Result<(), DataError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let meta_path = self.meta_path();
        if meta_path.exists() {
            fs::remove_file(&meta_path)
                .map_err(|e| DataError::CacheError(format!("remove stale meta: {e}")))?;
        }

        let mut df = records_to_dataframe(records)?;
        let path = self.data_path();
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            start_date: range.start,
            end_date: range.end,
            record_count: records.len(),
            data_hash: records_hash(records)?,
            source: "fiscal_data".to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        let meta_tmp = meta_path.with_extension("json.tmp");
        fs::write(&meta_tmp, meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;
        fs::rename(&meta_tmp, &meta_path)
            .map_err(|e| DataError::CacheError(format!("meta rename: {e}")))?;

        tracing::info!(records = records.len(), %range, dir = %self.cache_dir.display(), "cached auctions");
        Ok(())
    }
}

fn records_hash(records: &[AuctionRecord]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(records)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS
}

fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_CE_DAYS)?)
}

fn date_column(name: &str, values: Vec<Option<i32>>) -> Result<Column, DataError> {
    Column::new(name.into(), values)
        .cast(&DataType::Date)
        .map_err(|e| DataError::ParquetError(format!("{name} cast: {e}")))
}

/// Convert auction records to a Polars DataFrame in `AuctionSchema` layout.
fn records_to_dataframe(records: &[AuctionRecord]) -> Result<DataFrame, DataError> {
    let dates = |f: fn(&AuctionRecord) -> Option<NaiveDate>| -> Vec<Option<i32>> {
        records.iter().map(|r| f(r).map(epoch_days)).collect()
    };

    let cusips: Vec<&str> = records.iter().map(|r| r.cusip.as_str()).collect();
    let types: Vec<&str> = records.iter().map(|r| r.security_type.as_str()).collect();
    let rates: Vec<Option<f64>> = records.iter().map(|r| r.interest_rate).collect();
    let accepted: Vec<Option<f64>> = records.iter().map(|r| r.total_accepted).collect();
    let reopening: Vec<bool> = records.iter().map(|r| r.is_reopening).collect();
    let tips: Vec<bool> = records.iter().map(|r| r.is_inflation_indexed).collect();
    let frn: Vec<bool> = records.iter().map(|r| r.is_floating_rate).collect();
    let announced: Vec<Option<&str>> = records
        .iter()
        .map(|r| r.announced_cusip.as_deref())
        .collect();

    DataFrame::new(vec![
        Column::new("cusip".into(), cusips),
        Column::new("security_type".into(), types),
        date_column("issue_date", dates(|r| Some(r.issue_date)))?,
        date_column("original_issue_date", dates(|r| r.original_issue_date))?,
        date_column("maturity_date", dates(|r| Some(r.maturity_date)))?,
        Column::new("interest_rate".into(), rates),
        Column::new("total_accepted".into(), accepted),
        Column::new("is_reopening".into(), reopening),
        Column::new("is_inflation_indexed".into(), tips),
        Column::new("is_floating_rate".into(), frn),
        date_column("announcement_date", dates(|r| Some(r.announcement_date)))?,
        Column::new("announced_cusip".into(), announced),
        date_column("auction_date", dates(|r| Some(r.auction_date)))?,
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<AuctionRecord>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;
    AuctionSchema::validate(&df)?;
    dataframe_to_records(&df)
}

/// Integer view of a Date column.
fn day_numbers(df: &DataFrame, name: &str) -> Result<Int32Chunked, DataError> {
    let column = df
        .column(name)
        .and_then(|c| c.cast(&DataType::Int32))
        .map_err(|e| DataError::ParquetError(format!("{name} column: {e}")))?;
    column
        .i32()
        .cloned()
        .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))
}

fn required_date(days: &Int32Chunked, name: &str, row: usize) -> Result<NaiveDate, DataError> {
    days.get(row)
        .and_then(from_epoch_days)
        .ok_or_else(|| DataError::ValidationError(format!("null or invalid {name} at row {row}")))
}

/// Convert a DataFrame back to auction records.
fn dataframe_to_records(df: &DataFrame) -> Result<Vec<AuctionRecord>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    let cusip = df.column("cusip").map_err(map_err)?.str().map_err(map_err)?;
    let security_type = df
        .column("security_type")
        .map_err(map_err)?
        .str()
        .map_err(map_err)?;
    let rate = df.column("interest_rate").map_err(map_err)?.f64().map_err(map_err)?;
    let accepted = df.column("total_accepted").map_err(map_err)?.f64().map_err(map_err)?;
    let reopening = df.column("is_reopening").map_err(map_err)?.bool().map_err(map_err)?;
    let tips = df
        .column("is_inflation_indexed")
        .map_err(map_err)?
        .bool()
        .map_err(map_err)?;
    let frn = df.column("is_floating_rate").map_err(map_err)?.bool().map_err(map_err)?;
    let announced = df
        .column("announced_cusip")
        .map_err(map_err)?
        .str()
        .map_err(map_err)?;

    let issue = day_numbers(df, "issue_date")?;
    let original_issue = day_numbers(df, "original_issue_date")?;
    let maturity = day_numbers(df, "maturity_date")?;
    let announcement = day_numbers(df, "announcement_date")?;
    let auction = day_numbers(df, "auction_date")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let id = cusip
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null cusip at row {i}")))?;
        let kind = security_type
            .get(i)
            .ok_or_else(|| DataError::ValidationError(format!("null security_type at row {i}")))?
            .parse::<SecurityType>()
            .map_err(DataError::ValidationError)?;

        records.push(AuctionRecord {
            cusip: id.to_string(),
            security_type: kind,
            issue_date: required_date(&issue, "issue_date", i)?,
            original_issue_date: original_issue.get(i).and_then(from_epoch_days),
            maturity_date: required_date(&maturity, "maturity_date", i)?,
            interest_rate: rate.get(i),
            total_accepted: accepted.get(i),
            is_reopening: reopening.get(i).unwrap_or(false),
            is_inflation_indexed: tips.get(i).unwrap_or(false),
            is_floating_rate: frn.get(i).unwrap_or(false),
            announcement_date: required_date(&announcement, "announcement_date", i)?,
            announced_cusip: announced.get(i).map(str::to_string),
            auction_date: required_date(&auction, "auction_date", i)?,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(d("2024-01-01"), d("2024-03-31")).unwrap()
    }

    fn sample_records() -> Vec<AuctionRecord> {
        vec![
            AuctionRecord {
                cusip: "912797HP5".into(),
                security_type: SecurityType::Bill,
                issue_date: d("2024-01-30"),
                original_issue_date: None,
                maturity_date: d("2024-02-27"),
                interest_rate: None,
                total_accepted: Some(75_000.0),
                is_reopening: false,
                is_inflation_indexed: false,
                is_floating_rate: false,
                announcement_date: d("2024-01-25"),
                announced_cusip: None,
                auction_date: d("2024-01-25"),
            },
            AuctionRecord {
                cusip: "91282CJZ5".into(),
                security_type: SecurityType::Note,
                issue_date: d("2024-02-15"),
                original_issue_date: Some(d("2024-01-16")),
                maturity_date: d("2034-02-15"),
                interest_rate: Some(4.0),
                total_accepted: None,
                is_reopening: true,
                is_inflation_indexed: false,
                is_floating_rate: false,
                announcement_date: d("2024-02-01"),
                announced_cusip: Some("91282CJZ5".into()),
                auction_date: d("2024-02-08"),
            },
        ]
    }

    #[test]
    fn put_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());

        cache.put(range(), &sample_records()).unwrap();
        let loaded = cache.get(range()).unwrap().unwrap();

        assert_eq!(loaded, sample_records());
    }

    #[test]
    fn empty_cache_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        assert!(cache.get(range()).unwrap().is_none());
    }

    #[test]
    fn different_range_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.put(range(), &sample_records()).unwrap();

        let other = DateRange::new(d("2024-01-01"), d("2024-04-01")).unwrap();
        assert!(cache.get(other).unwrap().is_none());
    }

    #[test]
    fn meta_records_range_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.put(range(), &sample_records()).unwrap();

        let meta = cache.get_meta().unwrap();
        assert_eq!(meta.range(), Some(range()));
        assert_eq!(meta.record_count, 2);
        assert_eq!(meta.data_hash.len(), 64);
    }

    #[test]
    fn corrupt_file_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.put(range(), &sample_records()).unwrap();

        fs::write(dir.path().join(DATA_FILE), b"not parquet").unwrap();

        assert!(cache.get(range()).unwrap().is_none());
        assert!(dir.path().join("auctions.parquet.quarantined").exists());
        assert!(cache.get_meta().is_none());
    }

    #[test]
    fn count_mismatch_is_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.put(range(), &sample_records()).unwrap();

        let mut meta = cache.get_meta().unwrap();
        meta.record_count = 5;
        fs::write(
            dir.path().join(META_FILE),
            serde_json::to_string(&meta).unwrap(),
        )
        .unwrap();

        assert!(cache.get(range()).unwrap().is_none());
    }

    #[test]
    fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ParquetCache::new(dir.path());
        cache.put(range(), &sample_records()).unwrap();

        assert!(cache.clear().unwrap());
        assert!(cache.get_meta().is_none());
        assert!(!cache.clear().unwrap());
    }

    #[test]
    fn memory_store_keys_on_range() {
        let store = MemoryStore::new();
        assert!(store.get(range()).unwrap().is_none());
        store.put(range(), &sample_records()).unwrap();
        assert_eq!(store.get(range()).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn epoch_day_conversion_is_exact() {
        assert_eq!(epoch_days(d("1970-01-01")), 0);
        assert_eq!(epoch_days(d("2024-01-30")), 19_752);
        assert_eq!(from_epoch_days(19_752), Some(d("2024-01-30")));
        assert_eq!(from_epoch_days(-1), Some(d("1969-12-31")));
    }
}
