// CSV/TSV table ingest and flat CSV report export

use std::io::Read;
use std::path::Path;

use resmatch_engine::{MatchError, MatchReport, RawTable};

use crate::{cents_to_major, fields_label};

/// Load a delimited text file into a raw table.
///
/// The delimiter is sniffed from the first few lines; non-UTF-8 content
/// falls back to Windows-1252, the usual Excel export encoding.
pub fn read_table(path: &Path) -> Result<RawTable, MatchError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    parse_table(&content, delimiter)
}

fn read_file_as_utf8(path: &Path) -> Result<String, MatchError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| MatchError::Io(format!("{}: {e}", path.display())))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| MatchError::Io(format!("{}: {e}", path.display())))?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Detect the most likely field delimiter by checking consistency across
/// the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line.
/// The delimiter with the most consistent field count (>1 field) wins;
/// ties break toward the higher field count.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn parse_table(content: &str, delimiter: u8) -> Result<RawTable, MatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| MatchError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| MatchError::Io(e.to_string()))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable { headers, rows })
}

/// Flat single-file CSV export: one annotated row per outcome, followed by
/// a summary section and the ingest warnings.
pub fn export_csv(report: &MatchReport) -> Result<Vec<u8>, MatchError> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let err = |e: csv::Error| MatchError::Export(e.to_string());

    wtr.write_record([
        "bucket",
        "order_id",
        "reservation_id",
        "order_row",
        "reservation_row",
        "score",
        "matched_fields",
        "reason",
        "tied_reservation_ids",
    ])
    .map_err(err)?;

    for row in &report.outcomes {
        wtr.write_record([
            row.bucket.to_string(),
            row.order_id.clone().unwrap_or_default(),
            row.reservation_id.clone().unwrap_or_default(),
            row.order_row.map(|r| r.to_string()).unwrap_or_default(),
            row.reservation_row.map(|r| r.to_string()).unwrap_or_default(),
            row.score.map(|s| format!("{s:.4}")).unwrap_or_default(),
            row.matched_fields.as_ref().map(fields_label).unwrap_or_default(),
            row.reason.map(|r| r.to_string()).unwrap_or_default(),
            row.tied_reservation_ids.join(";"),
        ])
        .map_err(err)?;
    }

    let s = &report.summary;
    let summary_rows: &[(&str, String)] = &[
        ("config_name", report.meta.config_name.clone()),
        ("engine_version", report.meta.engine_version.clone()),
        ("run_at", report.meta.run_at.clone()),
        ("total_orders", s.total_orders.to_string()),
        ("total_reservations", s.total_reservations.to_string()),
        ("matched", s.matched.to_string()),
        ("ambiguous", s.ambiguous.to_string()),
        ("unmatched_orders", s.unmatched_orders.to_string()),
        ("unmatched_reservations", s.unmatched_reservations.to_string()),
        ("match_rate_pct", format!("{:.1}", s.match_rate_pct)),
        ("order_amount", cents_to_major(s.order_amount_cents)),
        ("matched_amount", cents_to_major(s.matched_amount_cents)),
        ("unmatched_amount", cents_to_major(s.unmatched_amount_cents)),
    ];

    wtr.write_record([""]).map_err(err)?;
    wtr.write_record(["summary", "value"]).map_err(err)?;
    for (key, value) in summary_rows {
        wtr.write_record([*key, value.as_str()]).map_err(err)?;
    }

    if !report.warnings.is_empty() {
        wtr.write_record([""]).map_err(err)?;
        wtr.write_record(["warning_source", "row", "field", "raw_value", "reason"])
            .map_err(err)?;
        for w in &report.warnings {
            wtr.write_record([
                w.source.as_str(),
                &w.row.to_string(),
                w.field.as_str(),
                w.raw_value.as_str(),
                w.reason.as_str(),
            ])
            .map_err(err)?;
        }
    }

    wtr.into_inner().map_err(|e| MatchError::Export(e.to_string()))
}
