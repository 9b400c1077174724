//! Pension CLI - Command line interface for the pension analytics engine.
//!
//! Every command prints an `ApiResponse` JSON document on stdout; logs go to
//! stderr and are controlled with `RUST_LOG`.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use pension_core::{
    export::default_file_name,
    format::{quarter_label, stat_cells},
    offline::{FileFetcher, OfflineCache},
    store::FileStore,
    ApiResponse, AssetClass, CompareMode, Dashboard, DashboardConfig, DataType, DetailColumn,
    LoadOutcome, StatsColumn,
};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pension")]
#[command(about = "Pension fund manager analytics - returns, drawdowns and rankings")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ~/.pension/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSON document and keep it as the current dataset
    Upload {
        /// Path to the nested manager/metric/date JSON document
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Show what is loaded and the default selection
    Status,
    /// List managers
    Managers,
    /// List dates, newest first, with their indices
    Dates,
    /// Ranked interval statistics
    Stats {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Filtered records
    Detail {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Chart series for the selection
    Chart {
        #[command(flatten)]
        view: ViewArgs,
        /// Also write the chart as SVG to this path
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Export the filtered records as CSV
    Export {
        #[command(flatten)]
        view: ViewArgs,
        /// Output path (defaults to pension_analysis_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Reload the data resource through the offline cache
    Refresh {
        /// Directory holding the data resource (defaults to the configured data_dir)
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },
    /// Forget the stored dataset
    Reset,
}

/// Selection arguments shared by the query commands.
#[derive(Args, Debug, Default)]
struct ViewArgs {
    /// Start boundary: index into the newest-first date list, or a date
    #[arg(long)]
    start: Option<String>,
    /// End boundary: index into the newest-first date list, or a date
    #[arg(long)]
    end: Option<String>,
    /// Data type: return, scale or asset
    #[arg(long = "type", value_parser = parse_data_type)]
    data_type: Option<DataType>,
    /// Asset class for returns: fixed or other
    #[arg(long, value_parser = parse_asset_class)]
    category: Option<AssetClass>,
    /// Compare mode: trend or cross-section
    #[arg(long, value_parser = parse_compare_mode)]
    mode: Option<CompareMode>,
    /// Managers to include (comma-separated, defaults to all)
    #[arg(long, value_delimiter = ',')]
    managers: Option<Vec<String>>,
    /// Column header click; repeat to click again
    #[arg(long = "sort")]
    sort: Vec<String>,
}

fn parse_data_type(value: &str) -> Result<DataType, String> {
    DataType::parse(value).ok_or_else(|| format!("unknown data type: {value}"))
}

fn parse_asset_class(value: &str) -> Result<AssetClass, String> {
    AssetClass::parse(value).ok_or_else(|| format!("unknown asset class: {value}"))
}

fn parse_compare_mode(value: &str) -> Result<CompareMode, String> {
    CompareMode::parse(value).ok_or_else(|| format!("unknown compare mode: {value}"))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let response = match run(cli) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::err(format!("{e:#}")),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<Value> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::load_from_path(path)?,
        None => DashboardConfig::load()?,
    };
    let mut store = FileStore::with_path(config.store_path());
    let mut dashboard = Dashboard::new(config);

    match cli.command {
        Commands::Upload { file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let records = dashboard.upload(&text, &mut store)?;
            Ok(json!({
                "records": records,
                "managers": dashboard.dataset().managers(),
                "dates": dashboard.dataset().dates().len(),
                "store": store.path(),
            }))
        }
        Commands::Status => {
            let outcome = dashboard.start(&mut store);
            Ok(json!({
                "outcome": outcome,
                "store": store.path(),
                "locale": dashboard.i18n().locale(),
                "managers": dashboard.dataset().managers().len(),
                "dates": dashboard.dataset().dates().len(),
                "view": dashboard.view(),
            }))
        }
        Commands::Managers => {
            require_data(&mut dashboard, &mut store)?;
            Ok(json!({ "managers": dashboard.dataset().managers() }))
        }
        Commands::Dates => {
            require_data(&mut dashboard, &mut store)?;
            let dates: Vec<Value> = dashboard
                .dataset()
                .dates()
                .iter()
                .enumerate()
                .map(|(index, date)| {
                    json!({ "index": index, "date": date, "period": quarter_label(date) })
                })
                .collect();
            Ok(json!({ "dates": dates }))
        }
        Commands::Stats { view } => {
            require_data(&mut dashboard, &mut store)?;
            apply_view(&mut dashboard, &view)?;
            let derived = dashboard.recompute()?;
            let active_dates = derived.active_dates.clone();
            let missing = derived.missing_managers.clone();
            let label = derived.data_type_label.clone();

            for column in &view.sort {
                let Some(column) = StatsColumn::parse(column) else {
                    bail!("unknown statistics column: {column}");
                };
                dashboard.sort_stats(column)?;
            }

            let data_type = dashboard.view().data_type;
            let i18n = dashboard.i18n().clone();
            let rows = dashboard
                .derived()
                .map(|d| d.stats.clone())
                .unwrap_or_default();
            let mut headers = vec![i18n.t("column.rank")];
            headers.extend(
                StatsColumn::for_data_type(data_type)
                    .iter()
                    .map(|c| i18n.t(c.header_key())),
            );
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| stat_cells(row, data_type, &i18n))
                .collect();

            Ok(json!({
                "data_type": label,
                "active_dates": active_dates,
                "sort": dashboard.view().stats_sort,
                "headers": headers,
                "rows": rows,
                "cells": cells,
                "missing_managers": missing,
            }))
        }
        Commands::Detail { view } => {
            require_data(&mut dashboard, &mut store)?;
            apply_view(&mut dashboard, &view)?;
            dashboard.recompute()?;

            for column in &view.sort {
                let Some(column) = DetailColumn::parse(column) else {
                    bail!("unknown detail column: {column}");
                };
                dashboard.sort_detail(column)?;
            }

            let rows = dashboard
                .derived()
                .map(|d| d.detail.clone())
                .unwrap_or_default();
            Ok(json!({
                "sort": dashboard.view().detail_sort,
                "rows": rows,
            }))
        }
        Commands::Chart { view, svg } => {
            require_data(&mut dashboard, &mut store)?;
            apply_view(&mut dashboard, &view)?;
            let chart = dashboard.recompute()?.chart.clone();

            let svg_path = match svg {
                Some(path) => {
                    let rendered = dashboard.export_svg()?;
                    fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    Some(path)
                }
                None => None,
            };
            Ok(json!({ "chart": chart, "svg": svg_path }))
        }
        Commands::Export { view, output } => {
            require_data(&mut dashboard, &mut store)?;
            apply_view(&mut dashboard, &view)?;
            dashboard.recompute()?;

            let path = output
                .unwrap_or_else(|| PathBuf::from(default_file_name(dashboard.i18n(), "csv")));
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let rows = dashboard.export_csv(BufWriter::new(file))?;
            Ok(json!({ "path": path, "rows": rows }))
        }
        Commands::Refresh { source_dir } => {
            let source_dir = source_dir.unwrap_or_else(|| dashboard.config().data_dir());
            let cache_path = cache_snapshot_path(store.path());
            let mut cache = OfflineCache::new(
                FileFetcher::new(&source_dir),
                dashboard.config().data_resource(),
            );
            if let Err(e) = cache.load_snapshot(&cache_path) {
                tracing::warn!(error = %e, "ignoring unreadable offline cache");
            }

            let refreshed = dashboard.refresh(&mut cache, &mut store)?;
            cache.save_snapshot(&cache_path)?;
            Ok(json!({
                "records": refreshed.records,
                "from_cache": refreshed.from_cache,
                "source": source_dir,
            }))
        }
        Commands::Reset => {
            dashboard.reset(&mut store)?;
            Ok(json!({ "message": "Stored dataset cleared", "store": store.path() }))
        }
    }
}

fn cache_snapshot_path(store_path: &Path) -> PathBuf {
    store_path.with_file_name("offline_cache.json")
}

fn require_data(dashboard: &mut Dashboard, store: &mut FileStore) -> anyhow::Result<()> {
    match dashboard.start(store) {
        LoadOutcome::Restored { .. } => Ok(()),
        LoadOutcome::UploadRequired => {
            bail!("No dataset loaded. Run `pension upload --file <path>` first.")
        }
    }
}

/// Resolve a boundary given as a date string or as an index.
///
/// Known dates win over indices, so `20241231` names a date when the dataset
/// uses that layout.
fn resolve_boundary(dashboard: &Dashboard, value: &str) -> anyhow::Result<usize> {
    let dataset = dashboard.dataset();
    if let Some(index) = dataset.date_index(value.trim()) {
        return Ok(index);
    }
    let Ok(index) = value.trim().parse::<usize>() else {
        bail!("unknown date: {value}");
    };
    let len = dataset.dates().len();
    if index >= len {
        bail!("date index {index} out of range ({len} dates)");
    }
    Ok(index)
}

fn apply_view(dashboard: &mut Dashboard, args: &ViewArgs) -> anyhow::Result<()> {
    let mut view = dashboard.view().clone();

    if let Some(end) = &args.end {
        view.end_index = resolve_boundary(dashboard, end)?;
        // keep the default lookback relative to the new end
        if args.start.is_none() {
            let last_index = dashboard.dataset().dates().len().saturating_sub(1);
            view.start_index = view
                .end_index
                .saturating_add(dashboard.config().lookback())
                .min(last_index);
        }
    }
    if let Some(start) = &args.start {
        view.start_index = resolve_boundary(dashboard, start)?;
    }
    if let Some(data_type) = args.data_type {
        view.data_type = data_type;
    }
    if let Some(asset_class) = args.category {
        view.asset_class = asset_class;
    }
    if let Some(mode) = args.mode {
        view.compare_mode = mode;
    }
    if let Some(managers) = &args.managers {
        view.selected_managers = managers
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
    }

    dashboard.set_view(view);
    Ok(())
}
