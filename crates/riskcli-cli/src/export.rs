//! Export of computed metrics to JSON or CSV.
//!
//! Undefined metrics are never written as `0` or `NaN`: JSON uses `null` plus
//! an entry in the `undefined` map, CSV leaves the value empty and fills the
//! `reason` column.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use riskcli_core::{CompareResult, PeriodReport, Symbol, ValidationError};
use serde_json::{json, Map, Value};

use crate::error::CliError;
use crate::metadata::RunMetadata;

/// File format chosen from the export path's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(ValidationError::UnsupportedExportFormat {
                value: path.display().to_string(),
            }),
        }
    }
}

/// What is being exported.
#[derive(Debug, Clone, Copy)]
pub enum ExportPayload<'a> {
    Single(&'a PeriodReport),
    Compare(&'a CompareResult),
}

impl ExportPayload<'_> {
    fn ticker(&self) -> &Symbol {
        match self {
            Self::Single(report) => &report.summary.symbol,
            Self::Compare(result) => &result.primary.summary.symbol,
        }
    }
}

/// Write `payload` to `path` in the format implied by its extension.
pub fn write(path: &Path, payload: ExportPayload<'_>, meta: &RunMetadata) -> Result<(), CliError> {
    let format = ExportFormat::from_path(path)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &to_json(payload, meta))?;
            writeln!(writer)?;
        }
        ExportFormat::Csv => write_csv(&mut writer, payload)?,
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), "exported metrics");
    Ok(())
}

/// JSON document for `payload`.
pub fn to_json(payload: ExportPayload<'_>, meta: &RunMetadata) -> Value {
    let mut root = Map::new();
    root.insert(String::from("ticker"), json!(payload.ticker().as_str()));
    root.insert(String::from("generated_at"), json!(meta.generated_at.format_rfc3339()));
    root.insert(String::from("request_id"), json!(meta.request_id.to_string()));

    match payload {
        ExportPayload::Single(report) => {
            root.extend(period_object(report));
        }
        ExportPayload::Compare(result) => {
            root.insert(
                String::from("primary"),
                Value::Object(period_object(&result.primary)),
            );
            root.insert(
                String::from("comparison"),
                Value::Object(period_object(&result.comparison)),
            );
        }
    }

    Value::Object(root)
}

fn period_object(report: &PeriodReport) -> Map<String, Value> {
    let metrics = &report.metrics;
    let mut object = Map::new();
    object.insert(String::from("period"), json!(report.period.as_str()));
    object.insert(String::from("interval"), json!(report.summary.interval.as_str()));
    object.insert(
        String::from("benchmark"),
        report
            .benchmark
            .as_ref()
            .map_or(Value::Null, |symbol| json!(symbol.as_str())),
    );
    object.insert(String::from("risk_free_rate"), json!(metrics.risk_free_rate.annual()));
    object.insert(String::from("observations"), json!(metrics.observations));

    let mut undefined = Map::new();
    for field in metrics.fields() {
        let value = match field.value.value() {
            Some(number) => json!(number),
            None => Value::Null,
        };
        object.insert(String::from(field.key), value);
        if let Some(reason) = field.value.reason() {
            undefined.insert(String::from(field.key), json!(reason.as_str()));
        }
    }
    object.insert(String::from("undefined"), Value::Object(undefined));
    object.insert(String::from("warnings"), json!(report.warnings));
    object
}

fn write_csv<W: Write>(writer: &mut W, payload: ExportPayload<'_>) -> Result<(), CliError> {
    match payload {
        ExportPayload::Single(report) => {
            writeln!(writer, "key,value,reason")?;
            write_csv_rows(writer, None, report)?;
        }
        ExportPayload::Compare(result) => {
            writeln!(writer, "period,key,value,reason")?;
            write_csv_rows(writer, Some(result.primary_period.as_str()), &result.primary)?;
            write_csv_rows(writer, Some(result.comparison_period.as_str()), &result.comparison)?;
        }
    }
    Ok(())
}

fn write_csv_rows<W: Write>(
    writer: &mut W,
    period: Option<&str>,
    report: &PeriodReport,
) -> Result<(), CliError> {
    let prefix = period.map(|period| format!("{period},")).unwrap_or_default();
    for field in report.metrics.fields() {
        let value = field.value.value().map(|v| v.to_string()).unwrap_or_default();
        let reason = field.value.reason().map(|r| r.as_str()).unwrap_or_default();
        writeln!(writer, "{prefix}{},{value},{reason}", field.key)?;
    }
    Ok(())
}
