use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, CotResult},
    market::{MarketKind, ReportKind},
};

/// Rolling window used for the positioning indicators: three years of weekly
/// reports.
pub const DEFAULT_WINDOW: usize = 156;

/// Percentile distance from 0/100 that counts as an extreme.
pub const DEFAULT_EXTREMES: u8 = 5;

/// Configuration of one analyzer run.
///
/// The CLI layer (or any other caller) fills this in; the core only consumes
/// it. Everything is validated up front via [`AnalyzerConfig::validate`] so a
/// contract violation never surfaces mid-batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Which CFTC report file is in scope.
    pub report: ReportKind,

    /// Markets to analyze. Each market is an independent computation.
    pub markets: Vec<MarketKind>,

    /// Trailing window size in rows. Rows before the `(window - 1)`-th have
    /// no defined index/percentile/zscore.
    pub window: usize,

    /// Extremes threshold in percentile points, in `[0, 50]`.
    pub extremes: u8,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            report: ReportKind::Disaggregated,
            markets: Vec::new(),
            window: DEFAULT_WINDOW,
            extremes: DEFAULT_EXTREMES,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> CotResult<()> {
        if self.window == 0 {
            return Err(ConfigError::InvalidWindow(self.window).into());
        }
        if self.extremes > 50 {
            return Err(ConfigError::InvalidThreshold(self.extremes).into());
        }
        if self.markets.is_empty() {
            return Err(ConfigError::NoMarkets.into());
        }
        Ok(())
    }
}
