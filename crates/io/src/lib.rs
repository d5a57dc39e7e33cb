// File I/O - table ingest (CSV/TSV, Excel) and report export (XLSX, CSV, JSON)

pub mod csv;
pub mod xlsx;

use std::path::Path;

use resmatch_engine::{MatchError, MatchReport, RawTable};

/// Serialization target for a match report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load a tabular input file, dispatching on extension.
///
/// CSV/TSV goes through delimiter sniffing and encoding recovery;
/// Excel formats go through calamine with all cells stringified.
pub fn read_table(path: &Path) -> Result<RawTable, MatchError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" | "tsv" | "txt" => csv::read_table(path),
        "xlsx" | "xls" | "xlsb" | "ods" => xlsx::read_table(path),
        other => Err(MatchError::Io(format!(
            "unsupported input format '.{other}' for {}: expected csv, tsv, xlsx, xls, xlsb or ods",
            path.display()
        ))),
    }
}

/// Serialize a report in the requested format.
///
/// Byte-stable: serializing the same report twice yields identical
/// output for every format.
pub fn export(report: &MatchReport, format: ExportFormat) -> Result<Vec<u8>, MatchError> {
    match format {
        ExportFormat::Xlsx => xlsx::export_xlsx(report),
        ExportFormat::Csv => csv::export_csv(report),
        ExportFormat::Json => serde_json::to_vec_pretty(report)
            .map_err(|e| MatchError::Export(format!("json serialization failed: {e}"))),
    }
}

/// "name+date+time" style label for which components scored.
pub(crate) fn fields_label(fields: &resmatch_engine::model::MatchedFields) -> String {
    let mut parts = Vec::new();
    if fields.name {
        parts.push("name");
    }
    if fields.date {
        parts.push("date");
    }
    if fields.time {
        parts.push("time");
    }
    if fields.amount {
        parts.push("amount");
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join("+")
    }
}

/// Render integer cents as a major-unit decimal string.
pub(crate) fn cents_to_major(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
