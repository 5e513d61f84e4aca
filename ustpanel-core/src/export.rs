//! Panel export: CSV and Parquet.
//!
//! Both formats use the camelCase column names and order of
//! `PANEL_COLUMNS`. Dates are ISO `YYYY-MM-DD`; absent values are empty
//! CSV fields or Parquet nulls.

use crate::data::cache::epoch_days;
use crate::domain::{PanelRow, PANEL_COLUMNS};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet export failed: {0}")]
    Parquet(#[from] PolarsError),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("unsupported output extension for {0} (expected .csv or .parquet)")]
    UnsupportedFormat(String),
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render the panel as CSV text.
pub fn export_panel_csv(rows: &[PanelRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(PANEL_COLUMNS)?;

    for r in rows {
        wtr.write_record([
            r.date.to_string(),
            r.cusip.clone(),
            r.security_type.to_string(),
            opt(r.tenor),
            r.vintage.to_string(),
            opt(r.coupon),
            r.maturity_date.to_string(),
            r.is_tips.to_string(),
            r.is_floating_rate.to_string(),
            r.first_issue_date.to_string(),
            opt(r.issuance_type.map(|t| t.as_str())),
            r.auction_date.to_string(),
            opt(r.unscheduled_reopening_date),
            r.amount_issued.to_string(),
            r.total_issued.to_string(),
            r.announcement_date.to_string(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_panel_csv(rows: &[PanelRow], path: &Path) -> Result<(), ExportError> {
    let text = export_panel_csv(rows)?;
    fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ─── Parquet export ─────────────────────────────────────────────────

fn date_column(name: &str, values: Vec<Option<i32>>) -> PolarsResult<Column> {
    Column::new(name.into(), values).cast(&DataType::Date)
}

/// Convert the panel into a DataFrame with `PANEL_COLUMNS` layout.
pub fn panel_to_dataframe(rows: &[PanelRow]) -> PolarsResult<DataFrame> {
    let dates = |f: fn(&PanelRow) -> Option<NaiveDate>| -> Vec<Option<i32>> {
        rows.iter().map(|r| f(r).map(epoch_days)).collect()
    };
    let [c_date, c_cusip, c_type, c_tenor, c_vintage, c_coupon, c_maturity, c_tips, c_frn, c_first, c_issuance, c_auction, c_unscheduled, c_amount, c_total, c_announcement] =
        PANEL_COLUMNS;

    DataFrame::new(vec![
        date_column(c_date, dates(|r| Some(r.date)))?,
        Column::new(
            c_cusip.into(),
            rows.iter().map(|r| r.cusip.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            c_type.into(),
            rows.iter()
                .map(|r| r.security_type.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            c_tenor.into(),
            rows.iter()
                .map(|r| r.tenor.map(i32::from))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            c_vintage.into(),
            rows.iter().map(|r| r.vintage).collect::<Vec<_>>(),
        ),
        Column::new(
            c_coupon.into(),
            rows.iter().map(|r| r.coupon).collect::<Vec<_>>(),
        ),
        date_column(c_maturity, dates(|r| Some(r.maturity_date)))?,
        Column::new(
            c_tips.into(),
            rows.iter().map(|r| r.is_tips).collect::<Vec<_>>(),
        ),
        Column::new(
            c_frn.into(),
            rows.iter().map(|r| r.is_floating_rate).collect::<Vec<_>>(),
        ),
        date_column(c_first, dates(|r| Some(r.first_issue_date)))?,
        Column::new(
            c_issuance.into(),
            rows.iter()
                .map(|r| r.issuance_type.map(|t| t.as_str()))
                .collect::<Vec<_>>(),
        ),
        date_column(c_auction, dates(|r| Some(r.auction_date)))?,
        date_column(c_unscheduled, dates(|r| r.unscheduled_reopening_date))?,
        Column::new(
            c_amount.into(),
            rows.iter().map(|r| r.amount_issued).collect::<Vec<_>>(),
        ),
        Column::new(
            c_total.into(),
            rows.iter().map(|r| r.total_issued).collect::<Vec<_>>(),
        ),
        date_column(c_announcement, dates(|r| Some(r.announcement_date)))?,
    ])
}

pub fn write_panel_parquet(rows: &[PanelRow], path: &Path) -> Result<(), ExportError> {
    let mut df = panel_to_dataframe(rows)?;
    let file = fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ParquetWriter::new(file).finish(&mut df)?;
    Ok(())
}

/// Write the panel in the format named by the path's extension.
pub fn write_panel(rows: &[PanelRow], path: &Path) -> Result<(), ExportError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => write_panel_csv(rows, path),
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => write_panel_parquet(rows, path),
        _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
    }
}
