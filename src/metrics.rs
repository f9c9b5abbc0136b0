use polars::{
    frame::DataFrame,
    prelude::{DataType, NamedFrom, Series},
};

use crate::{
    columns::{LONG_PREFIX, MetricCol, SHORT_PREFIX},
    error::{ConfigError, CotResult, DataError},
};

/// A trader classification present in the working table: both a long and a
/// short count column exist for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryGroup {
    pub name: String,
    pub long_col: String,
    pub short_col: String,
}

/// Scans the schema for `long_<g>` / `short_<g>` pairs, in column order.
///
/// Groups are report-variant-dependent, so they are discovered at runtime
/// instead of being a compile-time field list. A lone `long_*` or `short_*`
/// column is not a group.
pub(crate) fn discover_groups(df: &DataFrame) -> Vec<CategoryGroup> {
    let names: Vec<&str> = df
        .get_columns()
        .iter()
        .map(|c| c.name().as_str())
        .collect();

    names
        .iter()
        .filter_map(|name| {
            let group = name.strip_prefix(LONG_PREFIX)?;
            if group.is_empty() {
                return None;
            }
            let short_col = format!("{SHORT_PREFIX}{group}");
            names.contains(&short_col.as_str()).then(|| CategoryGroup {
                name: group.to_string(),
                long_col: (*name).to_string(),
                short_col,
            })
        })
        .collect()
}

/// Computes the four derived series for every discovered group and appends
/// them to the table: `net_<g>`, `cot_index_<g>`, `cot_percentile_<g>`,
/// `zscore_<g>`. Original columns are never dropped.
///
/// Rows must already be sorted ascending by date: the trailing windows are
/// order-sensitive. A derived value exists only where a full window of
/// defined `net` values ends at the row; everywhere else it is null.
///
/// # Errors
/// [`ConfigError::InvalidWindow`] when `window == 0` (checked before any
/// computation).
pub fn compute_metrics(df: &DataFrame, window: usize) -> CotResult<DataFrame> {
    if window == 0 {
        return Err(ConfigError::InvalidWindow(window).into());
    }

    let mut out = df.clone();
    for group in discover_groups(df) {
        let long = numeric_values(df, &group.long_col)?;
        let short = numeric_values(df, &group.short_col)?;
        let net: Vec<Option<f64>> = long
            .iter()
            .zip(&short)
            .map(|(l, s)| match (l, s) {
                (Some(l), Some(s)) => Some(l - s),
                _ => None,
            })
            .collect();

        let stats = rolling_stats(&net, window);

        out.with_column(Series::new(MetricCol::Net.with_group(&group.name), net))?;
        out.with_column(Series::new(
            MetricCol::CotIndex.with_group(&group.name),
            stats.index,
        ))?;
        out.with_column(Series::new(
            MetricCol::CotPercentile.with_group(&group.name),
            stats.percentile,
        ))?;
        out.with_column(Series::new(
            MetricCol::Zscore.with_group(&group.name),
            stats.zscore,
        ))?;
    }
    Ok(out)
}

/// Reads a column as nullable `f64`, casting if needed.
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> CotResult<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))?;
    let casted = column.cast(&DataType::Float64)?;
    Ok(casted.f64()?.to_vec())
}

struct RollingStats {
    index: Vec<Option<f64>>,
    percentile: Vec<Option<f64>>,
    zscore: Vec<Option<f64>>,
}

/// Walks the series once, evaluating each trailing window of exactly
/// `window` rows. A window that is incomplete (`i < window - 1`) or contains
/// a null yields null for all three statistics.
fn rolling_stats(net: &[Option<f64>], window: usize) -> RollingStats {
    let n = net.len();
    let mut stats = RollingStats {
        index: vec![None; n],
        percentile: vec![None; n],
        zscore: vec![None; n],
    };

    let mut buf: Vec<f64> = Vec::with_capacity(window);
    for i in 0..n {
        if i + 1 < window {
            continue;
        }
        let trailing = &net[i + 1 - window..=i];
        if trailing.iter().any(Option::is_none) {
            continue;
        }
        buf.clear();
        buf.extend(trailing.iter().flatten().copied());
        let current = buf[window - 1];

        stats.index[i] = cot_index(current, &buf);
        stats.percentile[i] = Some(percent_rank(current, &buf));
        stats.zscore[i] = z_score(current, &buf);
    }
    stats
}

/// Min-max normalization over the window, scaled to [0, 100]. Undefined
/// (null) when the window range is zero.
fn cot_index(current: f64, window: &[f64]) -> Option<f64> {
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return None;
    }
    Some(100.0 * (current - min) / (max - min))
}

/// Percent rank of `current` within the window, scaled to [0, 100].
///
/// Ties receive their average rank ("percent rank including ties"), matching
/// the common statistical-rank convention: equal values share one percentile.
fn percent_rank(current: f64, window: &[f64]) -> f64 {
    let below = window.iter().filter(|v| **v < current).count();
    let equal = window.iter().filter(|v| **v == current).count();
    let average_rank = below as f64 + (equal as f64 + 1.0) / 2.0;
    100.0 * average_rank / window.len() as f64
}

/// Standard score against the window mean, using the sample (n-1) standard
/// deviation. Undefined (null) when the variance is zero or the window has a
/// single row.
fn z_score(current: f64, window: &[f64]) -> Option<f64> {
    let n = window.len();
    if n < 2 {
        return None;
    }
    let mean = window.iter().sum::<f64>() / n as f64;
    let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    if variance == 0.0 {
        return None;
    }
    Some((current - mean) / variance.sqrt())
}
