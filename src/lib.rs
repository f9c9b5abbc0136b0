//! Commitments of Traders (COT) positioning analytics.
//!
//! Parses CFTC report text into per-market tables, derives rolling
//! positioning indicators (net position, COT index, percentile rank,
//! z-score) and flags positioning extremes.

mod columns;
mod config;
mod error;
mod export;
mod extremes;
mod market;
mod metrics;
mod parser;
mod pipeline;
mod source;

pub use columns::{LONG_PREFIX, MetricCol, ReportCol, SHORT_PREFIX};
pub use config::{AnalyzerConfig, DEFAULT_EXTREMES, DEFAULT_WINDOW};
pub use error::{ConfigError, CotError, CotResult, DataError, IoError};
pub use export::{FileExtension, PositioningReport, Report, ReportName, ToCsv, ToJson};
pub use extremes::detect_extremes;
pub use market::{MarketKind, ReportKind};
pub use metrics::compute_metrics;
pub use parser::parse_report;
pub use pipeline::run;
pub use source::{cache_path, load_report_text};
