use std::{fs, path::Path};

use polars::{
    frame::DataFrame,
    prelude::{
        CsvWriterOptions, IntoLazy, JsonFormat, JsonWriter, PlPath, SerWriter, SinkOptions,
        SinkTarget, col, lit,
    },
};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    columns::{MetricCol, ReportCol},
    error::{CotResult, DataError, IoError},
    market::MarketKind,
};

// ================================================================================================
// Traits
// ================================================================================================

/// Common interface over terminal report artifacts.
pub trait Report {
    /// Access the underlying DataFrame (Immutable).
    fn as_df(&self) -> &DataFrame;

    /// Access the underlying DataFrame (Mutable).
    fn as_df_mut(&mut self) -> &mut DataFrame;
}

pub trait ReportName {
    fn base_name(&self) -> String;

    fn filename(&self, ext: FileExtension) -> String {
        format!("{}.{}", self.base_name(), ext)
    }
}

pub trait ToJson {
    /// Serializes the report to a generic JSON Value: a `Value::Array` of
    /// row objects. Undefined cells come through as JSON `null`, keeping
    /// them distinguishable from zero and `false`.
    fn to_json(&self) -> CotResult<Value>;
}

pub trait ToCsv {
    /// Writes the report to a CSV file in the target directory. Undefined
    /// cells serialize as empty fields.
    ///
    /// # Side Effects
    /// - Creates the directory if missing.
    /// - Overwrites the file if it exists.
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FileExtension {
    Csv,
    Json,
}

// ================================================================================================
// Blanket Implementations
// ================================================================================================

impl<T> ToJson for T
where
    T: Report,
{
    fn to_json(&self) -> CotResult<Value> {
        let rows = to_json_rows(self.as_df())?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }
}

impl<T> ToCsv for T
where
    T: Report + ReportName,
{
    fn to_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: Option<&CsvWriterOptions>,
        sink_opts: Option<&SinkOptions>,
    ) -> CotResult<()> {
        let dir = dir.as_ref();
        let file_path = dir.join(self.filename(FileExtension::Csv));

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                IoError::FileSystem(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let uri = file_path.to_str().ok_or_else(|| {
            IoError::FileSystem(format!(
                "Path contains invalid UTF-8 characters: {}",
                file_path.display()
            ))
        })?;
        let target = SinkTarget::Path(PlPath::new(uri));
        let options = opts.cloned().unwrap_or_default();
        let sink_opts = sink_opts.cloned().unwrap_or_default();

        let sink_plan = self
            .as_df()
            .clone()
            .lazy()
            .sink_csv(target, options, None, sink_opts)
            .map_err(|e| DataError::DataFrame(format!("Failed to build CSV sink plan: {e}")))?;

        let _ = sink_plan.collect().map_err(|e| {
            DataError::DataFrame(format!(
                "Failed to write CSV to '{}': {e}",
                file_path.display()
            ))
        })?;

        Ok(())
    }
}

fn to_json_rows(df: &DataFrame) -> CotResult<Vec<serde_json::Map<String, Value>>> {
    let height = df.height();
    if height == 0 {
        return Ok(Vec::new());
    }

    let estimated_row_size = df.width() * (1 << 6);
    let mut buf = Vec::with_capacity(height * estimated_row_size);

    JsonWriter::new(&mut buf)
        .with_json_format(JsonFormat::Json)
        .finish(&mut df.clone())
        .map_err(|e| DataError::DataFrame(e.to_string()))?;

    let json_val: Value = serde_json::from_slice(&buf).map_err(IoError::Json)?;

    match json_val {
        Value::Array(rows) => {
            let mut out = Vec::with_capacity(rows.len());
            for v in rows {
                if let Value::Object(map) = v {
                    out.push(map);
                }
            }
            Ok(out)
        }
        _ => Err(DataError::DataFrame("Polars JSON output was not an array".to_string()).into()),
    }
}

// ================================================================================================
// Positioning Report
// ================================================================================================

/// The terminal artifact of one run: the concatenated per-market tables with
/// raw columns, derived metric series and extreme flags. Read-only from the
/// pipeline's point of view — export and plotting collaborators consume it.
#[derive(Debug, Clone)]
pub struct PositioningReport {
    df: DataFrame,
}

impl PositioningReport {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    /// The series a plotting collaborator draws for one market: `date`,
    /// `net_<group>` and `cot_index_<group>`.
    pub fn market_series(&self, market: MarketKind, group: &str) -> CotResult<DataFrame> {
        let net = MetricCol::Net.with_group(group);
        let index = MetricCol::CotIndex.with_group(group);
        for name in [net.as_str(), index.as_str()] {
            if self.df.column(name).is_err() {
                return Err(DataError::MissingColumn(name.to_string()).into());
            }
        }

        self.df
            .clone()
            .lazy()
            .filter(col(ReportCol::Market).eq(lit(market.as_str())))
            .select([col(ReportCol::Date), col(net), col(index)])
            .collect()
            .map_err(Into::into)
    }
}

impl Report for PositioningReport {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }

    fn as_df_mut(&mut self) -> &mut DataFrame {
        &mut self.df
    }
}

impl ReportName for PositioningReport {
    fn base_name(&self) -> String {
        "cot_data".to_string()
    }
}
