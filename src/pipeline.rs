use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use polars::{
    frame::DataFrame,
    prelude::{
        BooleanChunked, ChunkFull, DataType, Int32Chunked, IntoLazy, IntoSeries, NewChunkedArray,
        SortMultipleOptions, StringChunked, UnionArgs, concat_lf_diagonal,
    },
};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    columns::ReportCol,
    config::AnalyzerConfig,
    error::{ConfigError, CotResult, DataError},
    export::PositioningReport,
    extremes, market::MarketKind, metrics, parser, source,
};

/// Runs the full pipeline: load the report file once, analyze every
/// configured market independently, and merge the survivors into one
/// terminal table.
///
/// Markets have no cross-market data dependency, so they fan out over rayon.
/// One market's failure is logged and skipped (continue-on-error); only a
/// batch where *every* market failed is fatal ([`DataError::EmptyBatch`]).
pub fn run(cfg: &AnalyzerConfig, report_path: impl AsRef<Path>) -> CotResult<PositioningReport> {
    cfg.validate()?;
    let text = source::load_report_text(report_path)?;

    tracing::info!(
        report = cfg.report.as_str(),
        markets = cfg.markets.len(),
        window = cfg.window,
        "Starting positioning analysis"
    );
    let bar = progress_bar(cfg.markets.len() as u64)?;

    let results: Vec<(MarketKind, CotResult<DataFrame>)> = cfg
        .markets
        .par_iter()
        .map(|&market| {
            let result = analyze_market(&text, market, cfg);
            bar.inc(1);
            (market, result)
        })
        .collect();
    bar.finish_and_clear();

    let mut frames = Vec::with_capacity(results.len());
    for (market, result) in results {
        match result {
            Ok(df) => {
                tracing::info!(market = market.as_str(), rows = df.height(), "Market processed");
                frames.push(df.lazy());
            }
            Err(e) => {
                tracing::error!(market = market.as_str(), error = %e, "Skipping market");
            }
        }
    }

    if frames.is_empty() {
        return Err(
            DataError::EmptyBatch(format!("all {} markets failed", cfg.markets.len())).into(),
        );
    }

    let merged = concat_lf_diagonal(
        frames,
        UnionArgs {
            parallel: true,
            rechunk: true,
            ..Default::default()
        },
    )?
    .collect()?;

    Ok(PositioningReport::new(merged))
}

/// One market's full computation: parse, coerce dates, tag, derive metrics,
/// flag extremes. Pure and idempotent, so a retry is always safe.
#[tracing::instrument(skip(text, cfg), fields(market = market.as_str()))]
fn analyze_market(text: &str, market: MarketKind, cfg: &AnalyzerConfig) -> CotResult<DataFrame> {
    let df = parser::parse_report(text, market.keyword())?;
    let df = coerce_dates(df)?;
    let df = tag_market(df, market)?;
    let df = metrics::compute_metrics(&df, cfg.window)?;
    extremes::detect_extremes(&df, cfg.extremes)
}

/// Derives the typed `date` column from the raw source date column, drops
/// rows whose date does not parse, deduplicates per date (keeping the last
/// occurrence in file order — later lines supersede earlier vintages) and
/// sorts ascending. Rolling windows downstream rely on this order.
fn coerce_dates(df: DataFrame) -> CotResult<DataFrame> {
    let raw = df
        .column(ReportCol::AsOfDate.as_str())
        .map_err(|_| DataError::MissingColumn(ReportCol::AsOfDate.as_str().to_string()))?;

    // The parser may have inferred the date column as numeric (e.g. 20240102)
    // or kept it textual; both render to the same digit strings.
    let raw_strings: Vec<Option<String>> = match raw.dtype() {
        DataType::Float64 | DataType::Int64 => {
            let casted = raw.cast(&DataType::Int64)?;
            casted
                .i64()?
                .into_iter()
                .map(|opt| opt.map(|v| v.to_string()))
                .collect()
        }
        _ => {
            let casted = raw.cast(&DataType::String)?;
            casted
                .str()?
                .into_iter()
                .map(|opt| opt.map(|s| s.trim().to_string()))
                .collect()
        }
    };

    let epoch = NaiveDate::default();
    let days: Vec<Option<i32>> = raw_strings
        .iter()
        .map(|opt| {
            opt.as_deref()
                .and_then(parse_report_date)
                .map(|d| (d - epoch).num_days() as i32)
        })
        .collect();

    // Keep only the last row per date, in file order.
    let mut last_row: HashMap<i32, usize> = HashMap::with_capacity(days.len());
    for (i, day) in days.iter().enumerate() {
        if let Some(day) = day {
            last_row.insert(*day, i);
        }
    }
    let keep: BooleanChunked = days
        .iter()
        .enumerate()
        .map(|(i, day)| Some(matches!(day, Some(d) if last_row.get(d) == Some(&i))))
        .collect();

    let date_col = Int32Chunked::from_iter_options(ReportCol::Date.name(), days.into_iter())
        .into_date()
        .into_series();

    let mut out = df;
    out.with_column(date_col)?;
    let out = out.filter(&keep)?;
    out.sort([ReportCol::Date.as_str()], SortMultipleOptions::default())
        .map_err(Into::into)
}

/// Report dates appear as `YYYYMMDD`, the legacy `YYMMDD`, or ISO.
fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    ["%Y%m%d", "%y%m%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn tag_market(mut df: DataFrame, market: MarketKind) -> CotResult<DataFrame> {
    let tag = StringChunked::full(ReportCol::Market.name(), market.as_str(), df.height());
    df.with_column(tag.into_series())?;
    Ok(df)
}

fn progress_bar(capacity: u64) -> CotResult<ProgressBar> {
    let bar = ProgressBar::new(capacity);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(ConfigError::ProgressBar)?
            .progress_chars("#>-"),
    );
    Ok(bar)
}
