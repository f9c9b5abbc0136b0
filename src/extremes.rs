use polars::{
    frame::DataFrame,
    prelude::{NamedFrom, Series},
};

use crate::{
    columns::MetricCol,
    error::{ConfigError, CotResult},
    metrics::numeric_values,
};

/// Flags positioning extremes: for every `cot_percentile_<g>` column,
/// appends `extreme_high_<g>` (percentile >= 100 - threshold) and
/// `extreme_low_<g>` (percentile <= threshold).
///
/// Flags derive solely from the percentile, never from index or z-score. A
/// null percentile yields null flags — missing history is not "not extreme".
///
/// # Errors
/// [`ConfigError::InvalidThreshold`] when `threshold > 50` (checked before
/// any computation).
pub fn detect_extremes(df: &DataFrame, threshold: u8) -> CotResult<DataFrame> {
    if threshold > 50 {
        return Err(ConfigError::InvalidThreshold(threshold).into());
    }
    let high_bound = 100.0 - f64::from(threshold);
    let low_bound = f64::from(threshold);

    let percentile_cols: Vec<(String, String)> = df
        .get_columns()
        .iter()
        .filter_map(|c| {
            MetricCol::CotPercentile
                .group_of(c.name().as_str())
                .map(|group| (c.name().to_string(), group.to_string()))
        })
        .collect();

    let mut out = df.clone();
    for (column, group) in percentile_cols {
        let percentile = numeric_values(df, &column)?;

        let high: Vec<Option<bool>> = percentile
            .iter()
            .map(|p| p.map(|p| p >= high_bound))
            .collect();
        let low: Vec<Option<bool>> = percentile
            .iter()
            .map(|p| p.map(|p| p <= low_bound))
            .collect();

        out.with_column(Series::new(MetricCol::ExtremeHigh.with_group(&group), high))?;
        out.with_column(Series::new(MetricCol::ExtremeLow.with_group(&group), low))?;
    }
    Ok(out)
}
