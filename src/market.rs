use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ConfigError, CotResult};

/// Markets known to the analyzer, keyed by their short futures code.
///
/// The `keyword` is the case-insensitive substring used to select report
/// lines; the `price_symbol` is what a price-data collaborator would query
/// for the same market.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
pub enum MarketKind {
    #[strum(serialize = "EUR")]
    Eur,
    #[strum(serialize = "DX")]
    Dx,
    #[strum(serialize = "GC")]
    Gc,
    #[strum(serialize = "CL")]
    Cl,
    #[strum(serialize = "ES")]
    Es,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parses a market code coming in as configuration input (CLI flag,
    /// config file). Unknown codes are a caller contract violation.
    ///
    /// # Errors
    /// [`ConfigError::InvalidMarket`] carrying the offending code.
    pub fn from_code(code: &str) -> CotResult<Self> {
        Self::from_str(code).map_err(|_| ConfigError::InvalidMarket(code.to_string()).into())
    }

    /// Human-readable market name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MarketKind::Eur => "Euro FX",
            MarketKind::Dx => "US Dollar Index",
            MarketKind::Gc => "Gold",
            MarketKind::Cl => "Crude Oil WTI",
            MarketKind::Es => "E-mini S&P 500",
        }
    }

    /// Substring that identifies this market's lines in a CFTC report.
    pub fn keyword(&self) -> &'static str {
        match self {
            MarketKind::Eur => "EURO FX",
            MarketKind::Dx => "US DOLLAR INDEX",
            MarketKind::Gc => "GOLD",
            MarketKind::Cl => "CRUDE OIL",
            MarketKind::Es => "S&P 500",
        }
    }

    /// Ticker a price-data collaborator would use for this market.
    pub fn price_symbol(&self) -> &'static str {
        match self {
            MarketKind::Eur => "6E=F",
            MarketKind::Dx => "DX-Y.NYB",
            MarketKind::Gc => "GC=F",
            MarketKind::Cl => "CL=F",
            MarketKind::Es => "ES=F",
        }
    }
}

/// CFTC report variants. The variant selects which source file is in scope;
/// it never changes the parsing logic, only which trader-category groups the
/// file happens to expose.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReportKind {
    /// Legacy futures-only report.
    Legacy,
    /// Legacy futures-and-options combined report.
    LegacyFutopt,
    /// Disaggregated report (managed money, producers, swap dealers).
    Disaggregated,
    /// Traders in Financial Futures report.
    Tff,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Parses a report variant name coming in as configuration input.
    ///
    /// # Errors
    /// [`ConfigError::InvalidReport`] carrying the offending name.
    pub fn from_name(name: &str) -> CotResult<Self> {
        Self::from_str(name).map_err(|_| ConfigError::InvalidReport(name.to_string()).into())
    }

    /// Where the fetch collaborator downloads this report from.
    pub fn url(&self) -> &'static str {
        match self {
            ReportKind::Legacy => "https://www.cftc.gov/dea/futures/deacot.txt",
            ReportKind::LegacyFutopt => "https://www.cftc.gov/dea/futures/deacot_futopt.txt",
            ReportKind::Disaggregated => "https://www.cftc.gov/dea/futures/deacotdisagg.txt",
            ReportKind::Tff => "https://www.cftc.gov/dea/futures/deatif.txt",
        }
    }

    /// File name under which the fetch collaborator caches this report.
    pub fn cache_file_name(&self) -> String {
        format!("{}.txt", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::error::CotError;

    #[test]
    fn test_market_codes_roundtrip() {
        assert_eq!(MarketKind::from_str("GC").unwrap(), MarketKind::Gc);
        assert_eq!(MarketKind::Gc.to_string(), "GC");
        assert!(MarketKind::from_str("XX").is_err());
    }

    #[test]
    fn test_from_code_maps_unknown_into_config_error() {
        assert_eq!(MarketKind::from_code("GC").unwrap(), MarketKind::Gc);
        let err = MarketKind::from_code("SI").unwrap_err();
        assert!(matches!(
            err,
            CotError::Config(ConfigError::InvalidMarket(ref code)) if code == "SI"
        ));
    }

    #[test]
    fn test_from_name_maps_unknown_into_config_error() {
        assert_eq!(
            ReportKind::from_name("tff").unwrap(),
            ReportKind::Tff
        );
        let err = ReportKind::from_name("supplemental").unwrap_err();
        assert!(matches!(
            err,
            CotError::Config(ConfigError::InvalidReport(ref name)) if name == "supplemental"
        ));
    }

    #[test]
    fn test_market_keywords() {
        assert_eq!(MarketKind::Gc.keyword(), "GOLD");
        assert_eq!(MarketKind::Eur.keyword(), "EURO FX");
    }

    #[test]
    fn test_report_kind_serialization() {
        assert_eq!(ReportKind::LegacyFutopt.as_str(), "legacy_futopt");
        assert_eq!(
            ReportKind::from_str("disaggregated").unwrap(),
            ReportKind::Disaggregated
        );
        assert_eq!(
            ReportKind::Disaggregated.cache_file_name(),
            "disaggregated.txt"
        );
    }
}
