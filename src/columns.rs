use polars::prelude::PlSmallStr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Columns guaranteed to exist in every working table, independent of the
/// report variant.
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
pub enum ReportCol {
    /// Report date (timezone-naive calendar date).
    Date,
    /// Short market code (e.g. `GC`).
    Market,
    /// Raw source date column, as published by the CFTC.
    #[strum(serialize = "as_of_date_in_form_yyyymmdd")]
    AsOfDate,
}

impl From<ReportCol> for PlSmallStr {
    fn from(value: ReportCol) -> Self {
        value.as_str().into()
    }
}

impl ReportCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Prefix of the per-group long position count columns (`long_<group>`).
pub const LONG_PREFIX: &str = "long_";

/// Prefix of the per-group short position count columns (`short_<group>`).
pub const SHORT_PREFIX: &str = "short_";

/// Derived column families. The full column name is report-variant-dependent:
/// every family exists once per trader-category group discovered at runtime
/// (e.g. `net_noncommercial`, `cot_index_managed_money`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum MetricCol {
    /// Net position: long minus short.
    Net,
    /// Min-max normalization of net over the trailing window, in [0, 100].
    CotIndex,
    /// Percent rank of net within the trailing window, in [0, 100].
    CotPercentile,
    /// Standard score of net against trailing window mean and sample stddev.
    Zscore,
    /// Percentile in the upper tail (`>= 100 - threshold`).
    ExtremeHigh,
    /// Percentile in the lower tail (`<= threshold`).
    ExtremeLow,
}

impl MetricCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Builds the concrete column name for a trader-category group.
    pub fn with_group(&self, group: &str) -> PlSmallStr {
        format!("{}_{}", self.as_str(), group).into()
    }

    /// Extracts the group name out of a concrete column name, if the column
    /// belongs to this family.
    pub fn group_of<'a>(&self, column: &'a str) -> Option<&'a str> {
        column
            .strip_prefix(self.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|g| !g.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_col_names() {
        assert_eq!(ReportCol::Date.as_str(), "date");
        assert_eq!(ReportCol::Market.as_str(), "market");
        assert_eq!(ReportCol::AsOfDate.as_str(), "as_of_date_in_form_yyyymmdd");
    }

    #[test]
    fn test_metric_col_with_group() {
        assert_eq!(
            MetricCol::Net.with_group("noncommercial").as_str(),
            "net_noncommercial"
        );
        assert_eq!(
            MetricCol::CotPercentile.with_group("managed_money").as_str(),
            "cot_percentile_managed_money"
        );
    }

    #[test]
    fn test_group_of_roundtrip() {
        let name = MetricCol::CotIndex.with_group("leveraged_funds");
        assert_eq!(
            MetricCol::CotIndex.group_of(name.as_str()),
            Some("leveraged_funds")
        );
    }

    #[test]
    fn test_group_of_rejects_other_families() {
        // `cot_index` must not claim `cot_percentile_*` columns (or vice versa).
        assert_eq!(
            MetricCol::CotIndex.group_of("cot_percentile_noncommercial"),
            None
        );
        assert_eq!(MetricCol::CotPercentile.group_of("cot_percentile_"), None);
        assert_eq!(MetricCol::Net.group_of("network"), None);
    }
}
