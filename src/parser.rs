use std::{collections::HashMap, sync::LazyLock};

use polars::{
    frame::DataFrame,
    prelude::{Column, IntoColumn, NamedFrom, Series},
};
use regex::Regex;

use crate::error::{CotResult, DataError};

/// Columns in a CFTC report line are separated by runs of two or more
/// whitespace characters; single spaces belong to the cell content.
static COLUMN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("static column separator pattern"));

/// Extracts the rows of one market out of raw report text.
///
/// Every line containing `keyword` (case-insensitive) is selected; the first
/// matched line is the header, the rest are data rows. Header names are
/// normalized via [`normalize_header`] and checked for collisions.
///
/// # Errors
/// - [`DataError::KeywordNotFound`] when no line matches — the market is
///   absent from this report vintage.
/// - [`DataError::ColumnCollision`] when two distinct source headers
///   normalize to the same name.
/// - [`DataError::MalformedRow`] when a data line does not tabulate to the
///   header's column count.
pub fn parse_report(text: &str, keyword: &str) -> CotResult<DataFrame> {
    let needle = keyword.to_uppercase();
    let matched: Vec<&str> = text
        .lines()
        .filter(|line| line.to_uppercase().contains(&needle))
        .collect();

    let Some((header, rows)) = matched.split_first() else {
        return Err(DataError::KeywordNotFound(keyword.to_string()).into());
    };

    let raw_headers = split_columns(header);
    let names = normalized_headers(&raw_headers)?;
    let expected = names.len();

    let mut cells: Vec<Vec<&str>> = Vec::with_capacity(rows.len());
    for line in rows {
        let fields = split_columns(line);
        if fields.len() != expected {
            return Err(DataError::MalformedRow {
                line: line.trim().to_string(),
                expected,
                actual: fields.len(),
            }
            .into());
        }
        cells.push(fields);
    }

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(idx, name)| build_column(name, &cells, idx))
        .collect();

    DataFrame::new(columns).map_err(Into::into)
}

fn split_columns<'a>(line: &'a str) -> Vec<&'a str> {
    COLUMN_SEPARATOR
        .split(line.trim())
        .filter(|field| !field.is_empty())
        .collect()
}

/// Lowercases a source header and collapses every run of non-alphanumeric
/// characters into a single `_`, so that punctuation variants of the same
/// header ("Long (Non-Commercial)", "LONG NON COMMERCIAL") meet on one name.
fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut gap = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.extend(ch.to_lowercase());
        } else {
            gap = true;
        }
    }
    out
}

fn normalized_headers(raw_headers: &[&str]) -> CotResult<Vec<String>> {
    let mut seen: HashMap<String, &str> = HashMap::with_capacity(raw_headers.len());
    let mut names = Vec::with_capacity(raw_headers.len());
    for raw in raw_headers {
        let normalized = normalize_header(raw);
        if let Some(first) = seen.get(&normalized) {
            return Err(DataError::ColumnCollision {
                normalized,
                first: (*first).to_string(),
                second: (*raw).to_string(),
            }
            .into());
        }
        seen.insert(normalized.clone(), raw);
        names.push(normalized);
    }
    Ok(names)
}

/// A missing cell is empty or the CFTC's `.` placeholder.
fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed == "."
}

fn parse_numeric(cell: &str) -> Option<f64> {
    cell.trim().replace(',', "").parse::<f64>().ok()
}

/// Materializes column `idx`. A column where every non-missing cell parses
/// as a number (thousands separators stripped) becomes `Float64` with nulls
/// for missing cells; any other column stays `String`.
fn build_column(name: &str, rows: &[Vec<&str>], idx: usize) -> Column {
    let mut floats: Vec<Option<f64>> = Vec::with_capacity(rows.len());
    let mut numeric = true;
    for row in rows {
        let cell = row[idx];
        if is_missing(cell) {
            floats.push(None);
        } else if let Some(value) = parse_numeric(cell) {
            floats.push(Some(value));
        } else {
            numeric = false;
            break;
        }
    }

    if numeric {
        return Series::new(name.into(), floats).into_column();
    }

    let texts: Vec<Option<String>> = rows
        .iter()
        .map(|row| {
            let cell = row[idx];
            if is_missing(cell) {
                None
            } else {
                Some(cell.trim().to_string())
            }
        })
        .collect();
    Series::new(name.into(), texts).into_column()
}

#[cfg(test)]
mod tests {
    use polars::prelude::DataType;

    use super::*;
    use crate::error::CotError;

    const REPORT: &str = "\
Some unrelated preamble line\n\
GOLD - COMMODITY EXCHANGE INC.  As of Date in Form YYYYMMDD  Long (Noncommercial)  Short (Noncommercial)\n\
GOLD - COMMODITY EXCHANGE INC.  20240102  200,000  120,000\n\
GOLD - COMMODITY EXCHANGE INC.  20240109  .  121,500\n\
Another unrelated line mentioning silver\n\
GOLD - COMMODITY EXCHANGE INC.  20240116  205,750  119,000\n";

    // ========================================================================
    // Test: Happy Path
    // ========================================================================

    #[test]
    fn test_parse_selects_keyword_lines() {
        let df = parse_report(REPORT, "GOLD").unwrap();
        assert_eq!(df.height(), 3);
        let names: Vec<&str> = df.get_columns().iter().map(|c| c.name().as_str()).collect();
        assert_eq!(
            names,
            vec![
                "gold_commodity_exchange_inc",
                "as_of_date_in_form_yyyymmdd",
                "long_noncommercial",
                "short_noncommercial",
            ]
        );
    }

    #[test]
    fn test_numeric_inference_and_missing_cells() {
        let df = parse_report(REPORT, "GOLD").unwrap();

        let longs = df.column("long_noncommercial").unwrap();
        assert_eq!(longs.dtype(), &DataType::Float64);
        let longs = longs.f64().unwrap();
        assert_eq!(longs.get(0), Some(200_000.0));
        // The `.` placeholder must become null, never zero.
        assert_eq!(longs.get(1), None);
        assert_eq!(longs.get(2), Some(205_750.0));

        // A column with non-numeric content stays textual.
        let market_names = df.column("gold_commodity_exchange_inc").unwrap();
        assert_eq!(market_names.dtype(), &DataType::String);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let df = parse_report(REPORT, "gOlD").unwrap();
        assert_eq!(df.height(), 3);
    }

    // ========================================================================
    // Test: Error Conditions
    // ========================================================================

    #[test]
    fn test_keyword_not_found() {
        let err = parse_report(REPORT, "PLATINUM").unwrap_err();
        assert!(matches!(
            err,
            CotError::Data(DataError::KeywordNotFound(ref kw)) if kw == "PLATINUM"
        ));
    }

    #[test]
    fn test_header_collision_is_surfaced() {
        let text = "\
GOLD  Long (Non-Commercial)  LONG NON COMMERCIAL\n\
GOLD  1  2\n";
        let err = parse_report(text, "GOLD").unwrap_err();
        match err {
            CotError::Data(DataError::ColumnCollision {
                normalized,
                first,
                second,
            }) => {
                assert_eq!(normalized, "long_non_commercial");
                assert_eq!(first, "Long (Non-Commercial)");
                assert_eq!(second, "LONG NON COMMERCIAL");
            }
            other => panic!("expected ColumnCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_row_carries_context() {
        let text = "\
GOLD  As of Date in Form YYYYMMDD  Long (Noncommercial)\n\
GOLD  20240102  100\n\
GOLD  20240109\n";
        let err = parse_report(text, "GOLD").unwrap_err();
        match err {
            CotError::Data(DataError::MalformedRow {
                line,
                expected,
                actual,
            }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
                assert!(line.contains("20240109"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    // ========================================================================
    // Test: Header Normalization
    // ========================================================================

    #[test]
    fn test_normalize_header_variants() {
        assert_eq!(normalize_header("Long (Non-Commercial)"), "long_non_commercial");
        assert_eq!(normalize_header("LONG NON COMMERCIAL"), "long_non_commercial");
        assert_eq!(
            normalize_header("  As of Date in Form YYYYMMDD "),
            "as_of_date_in_form_yyyymmdd"
        );
        assert_eq!(normalize_header("Open Interest:"), "open_interest");
    }
}
