use indicatif::style::TemplateError;
use thiserror::Error;

pub type CotResult<T> = Result<T, CotError>;

#[derive(Debug, Error)]
pub enum CotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised by caller contract violations. All of these are rejected
/// before any computation starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid rolling window {0}: must be a positive number of rows")]
    InvalidWindow(usize),

    #[error("Invalid extremes threshold {0}: must lie in [0, 50]")]
    InvalidThreshold(u8),

    #[error("No markets selected")]
    NoMarkets,

    #[error("Invalid market code: '{0}'")]
    InvalidMarket(String),

    #[error("Invalid report kind: '{0}'")]
    InvalidReport(String),

    #[error("Progress bar error")]
    ProgressBar(#[from] TemplateError),
}

/// Errors related to report text parsing, table construction and derived
/// metric computation.
///
/// Note that an *undefined* metric value (insufficient window history, zero
/// range, zero variance) is not an error: it travels through the pipeline as
/// a polars null.
#[derive(Debug, Error)]
pub enum DataError {
    /// The market keyword matched no line of the report. Recoverable at the
    /// per-market level: the market is absent from this report vintage.
    #[error("No report lines found for keyword: '{0}'")]
    KeywordNotFound(String),

    /// A matched line does not tabulate to the same column count as the
    /// header. Carries enough context to diagnose upstream format drift.
    #[error("Malformed report row (expected {expected} columns, found {actual}): '{line}'")]
    MalformedRow {
        line: String,
        expected: usize,
        actual: usize,
    },

    /// Two distinct source headers normalized to the same column name. This
    /// is upstream-data breakage to surface, never to silently overwrite.
    #[error("Header collision: '{first}' and '{second}' both normalize to '{normalized}'")]
    ColumnCollision {
        normalized: String,
        first: String,
        second: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Every market in the batch failed. Fatal: there is nothing to export.
    #[error("No markets processed successfully: {0}")]
    EmptyBatch(String),

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),
}

impl From<polars::error::PolarsError> for CotError {
    fn from(e: polars::error::PolarsError) -> Self {
        CotError::Data(DataError::DataFrame(e.to_string()))
    }
}
