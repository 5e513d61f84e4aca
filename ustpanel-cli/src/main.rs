//! ustpanel CLI: build the Treasury CUSIP-date panel and manage the cache.
//!
//! Commands:
//! - `build`: load (or fetch) auction history, build the panel, export it,
//!   print summary statistics
//! - `cache status`: report the cached range, record count and size
//! - `cache clear`: remove the cached history

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use ustpanel_core::data::{load_auctions, DateRange, FiscalDataProvider, ParquetCache};
use ustpanel_core::export::write_panel;
use ustpanel_core::fingerprint::PanelFingerprint;
use ustpanel_core::report::PanelSummary;
use ustpanel_core::{build_panel, PanelConfig};

#[derive(Parser)]
#[command(
    name = "ustpanel",
    about = "U.S. Treasury CUSIP-date panel builder"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the CUSIP-date panel from Treasury auction history.
    Build {
        /// First auction date requested (YYYY-MM-DD). Defaults to 1990-01-01.
        #[arg(long)]
        start: Option<String>,

        /// Last auction date requested (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Reference date for when-issued resolution (YYYY-MM-DD). Defaults to the local date.
        #[arg(long)]
        today: Option<String>,

        /// Re-download even if the cache covers the requested range.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Overrides the config file; defaults to ./data.
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the panel to this file (.csv or .parquet).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Do not print the summary.
        #[arg(long, default_value_t = false)]
        silent: bool,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report the cached range, record count and size.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Remove the cached auction history.
    Clear {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Actually delete (without this flag, only previews what would be removed).
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
}

struct BuildArgs {
    start: Option<String>,
    end: Option<String>,
    today: Option<String>,
    force: bool,
    cache_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    silent: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            start,
            end,
            today,
            force,
            cache_dir,
            config,
            output,
            silent,
        } => run_build(BuildArgs {
            start,
            end,
            today,
            force,
            cache_dir,
            config,
            output,
            silent,
        }),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clear { cache_dir, confirm } => run_cache_clear(&cache_dir, confirm),
        },
    }
}

fn parse_date(flag: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{s}'"))
        })
        .transpose()
}

fn run_build(args: BuildArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PanelConfig::from_file(path)?,
        None => PanelConfig::default(),
    };

    let local_today = chrono::Local::now().date_naive();
    let today = parse_date("today", args.today.as_deref())?.unwrap_or(local_today);
    let start = parse_date("start", args.start.as_deref())?.unwrap_or(config.panel.start_date);
    let end = parse_date("end", args.end.as_deref())?
        .or(config.panel.end_date)
        .unwrap_or(local_today);
    let range = DateRange::new(start, end)?;

    let cache_dir = args.cache_dir.unwrap_or(config.cache.dir);
    let cache = ParquetCache::new(&cache_dir);
    let provider =
        FiscalDataProvider::with_endpoint(&config.source.base_url, config.source.page_size)?;

    let loaded = load_auctions(&provider, &cache, range, args.force)?;
    tracing::info!(
        records = loaded.records.len(),
        source = ?loaded.source,
        %range,
        "auction history ready"
    );

    let panel = build_panel(loaded.records, today);
    let fingerprint = PanelFingerprint::of(&panel, today);
    tracing::info!(
        rows = fingerprint.row_count,
        hash = %fingerprint.panel_hash,
        %today,
        "panel fingerprint"
    );

    if let Some(path) = &args.output {
        write_panel(&panel, path)
            .with_context(|| format!("failed to write panel to {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = panel.len(), "panel written");
    }

    if !args.silent {
        print!("{}", PanelSummary::from_rows(&panel));
    }

    Ok(())
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let Some(meta) = cache.get_meta() else {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    };

    println!("Cache:      {}", cache_dir.display());
    println!("Range:      {} to {}", meta.start_date, meta.end_date);
    println!("Records:    {}", meta.record_count);
    println!("Source:     {}", meta.source);
    println!("Cached at:  {}", meta.cached_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Hash:       {}", meta.data_hash);
    println!("Total size: {}", format_size(dir_size(cache_dir)));
    Ok(())
}

fn run_cache_clear(cache_dir: &Path, confirm: bool) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    match cache.get_meta() {
        Some(meta) => println!(
            "Cached history: {} to {} ({} records, {})",
            meta.start_date,
            meta.end_date,
            meta.record_count,
            format_size(dir_size(cache_dir))
        ),
        None => println!("No readable cache metadata in {}", cache_dir.display()),
    }

    if !confirm {
        println!();
        println!("Dry run: pass --confirm to actually delete.");
        return Ok(());
    }

    if cache.clear()? {
        println!("Removed cached auction history from {}", cache_dir.display());
    } else {
        println!("Nothing to remove in {}", cache_dir.display());
    }
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                size += meta.len();
            }
        }
    }
    size
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
