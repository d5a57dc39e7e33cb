// Excel ingest (xlsx, xls, xlsb, ods) and multi-sheet XLSX report export
//
// Import: one-way conversion. Cells are stringified into a raw table and
// re-parsed by the normalizer against the configured formats.
// Export: presentation snapshot for sharing. Not a round-trip format.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{
    DocProperties, ExcelDateTime, Format, Workbook as XlsxWorkbook, Worksheet,
};

use resmatch_engine::model::OutcomeRow;
use resmatch_engine::{MatchBucket, MatchError, MatchReport, RawTable};

use crate::{cents_to_major, fields_label};

/// Read the first sheet of an Excel file into a raw table.
///
/// The first row becomes the header row; every cell is stringified the
/// way it would appear in a CSV export of the sheet.
pub fn read_table(path: &Path) -> Result<RawTable, MatchError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| MatchError::Io(format!("{}: {e}", path.display())))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| MatchError::Io(format!("{}: file contains no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| MatchError::Io(format!("{}: sheet '{first}': {e}", path.display())))?;

    let mut rows_iter = range.rows();
    let headers = match rows_iter.next() {
        Some(row) => row.iter().map(|c| cell_to_string(c).trim().to_string()).collect(),
        None => Vec::new(),
    };

    let rows = rows_iter
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable { headers, rows })
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integral floats render without the trailing ".0" so that id
            // and amount columns survive Excel's numeric coercion.
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serial < 1.0 carries no date part; render the clock only.
            Some(ndt) if dt.as_f64() < 1.0 => ndt.format("%H:%M").to_string(),
            Some(ndt) if ndt.format("%H:%M:%S").to_string() == "00:00:00" => {
                ndt.format("%Y-%m-%d").to_string()
            }
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Export a report as a styled multi-sheet workbook:
/// Matched, Ambiguous, Unmatched Orders, Unmatched Reservations,
/// Summary, Warnings.
///
/// The workbook creation timestamp is pinned so that exporting the same
/// report twice produces byte-identical files.
pub fn export_xlsx(report: &MatchReport) -> Result<Vec<u8>, MatchError> {
    let err = |e: rust_xlsxwriter::XlsxError| MatchError::Export(e.to_string());

    let mut workbook = XlsxWorkbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1).map_err(err)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let header = Format::new().set_bold();

    write_matched_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;
    write_ambiguous_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;
    write_unmatched_orders_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;
    write_unmatched_reservations_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;
    write_summary_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;
    write_warnings_sheet(workbook.add_worksheet(), report, &header).map_err(err)?;

    workbook.save_to_buffer().map_err(err)
}

type XlsxResult = Result<(), rust_xlsxwriter::XlsxError>;

fn write_header(ws: &mut Worksheet, format: &Format, columns: &[&str]) -> XlsxResult {
    for (col, title) in columns.iter().enumerate() {
        ws.write_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

fn in_bucket<'a>(
    report: &'a MatchReport,
    bucket: MatchBucket,
) -> impl Iterator<Item = &'a OutcomeRow> {
    report.outcomes.iter().filter(move |r| r.bucket == bucket)
}

fn write_matched_sheet(ws: &mut Worksheet, report: &MatchReport, header: &Format) -> XlsxResult {
    ws.set_name("Matched")?;
    write_header(
        ws,
        header,
        &["Order ID", "Reservation ID", "Order Row", "Reservation Row", "Score", "Matched Fields"],
    )?;

    for (i, row) in in_bucket(report, MatchBucket::Matched).enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, row.order_id.as_deref().unwrap_or(""))?;
        ws.write(r, 1, row.reservation_id.as_deref().unwrap_or(""))?;
        if let Some(n) = row.order_row {
            ws.write(r, 2, n as u32)?;
        }
        if let Some(n) = row.reservation_row {
            ws.write(r, 3, n as u32)?;
        }
        if let Some(score) = row.score {
            ws.write(r, 4, score)?;
        }
        if let Some(ref fields) = row.matched_fields {
            ws.write(r, 5, fields_label(fields))?;
        }
    }
    Ok(())
}

fn write_ambiguous_sheet(ws: &mut Worksheet, report: &MatchReport, header: &Format) -> XlsxResult {
    ws.set_name("Ambiguous")?;
    write_header(ws, header, &["Order ID", "Order Row", "Top Score", "Tied Reservations"])?;

    for (i, row) in in_bucket(report, MatchBucket::Ambiguous).enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, row.order_id.as_deref().unwrap_or(""))?;
        if let Some(n) = row.order_row {
            ws.write(r, 1, n as u32)?;
        }
        if let Some(score) = row.score {
            ws.write(r, 2, score)?;
        }
        ws.write(r, 3, row.tied_reservation_ids.join(", "))?;
    }
    Ok(())
}

fn write_unmatched_orders_sheet(
    ws: &mut Worksheet,
    report: &MatchReport,
    header: &Format,
) -> XlsxResult {
    ws.set_name("Unmatched Orders")?;
    write_header(ws, header, &["Order ID", "Order Row", "Reason"])?;

    for (i, row) in in_bucket(report, MatchBucket::UnmatchedOrder).enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, row.order_id.as_deref().unwrap_or(""))?;
        if let Some(n) = row.order_row {
            ws.write(r, 1, n as u32)?;
        }
        if let Some(reason) = row.reason {
            ws.write(r, 2, reason.to_string())?;
        }
    }
    Ok(())
}

fn write_unmatched_reservations_sheet(
    ws: &mut Worksheet,
    report: &MatchReport,
    header: &Format,
) -> XlsxResult {
    ws.set_name("Unmatched Reservations")?;
    write_header(ws, header, &["Reservation ID", "Reservation Row", "Reason"])?;

    for (i, row) in in_bucket(report, MatchBucket::UnmatchedReservation).enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, row.reservation_id.as_deref().unwrap_or(""))?;
        if let Some(n) = row.reservation_row {
            ws.write(r, 1, n as u32)?;
        }
        if let Some(reason) = row.reason {
            ws.write(r, 2, reason.to_string())?;
        }
    }
    Ok(())
}

fn write_summary_sheet(ws: &mut Worksheet, report: &MatchReport, header: &Format) -> XlsxResult {
    ws.set_name("Summary")?;
    write_header(ws, header, &["Metric", "Value"])?;

    let s = &report.summary;
    let rows: Vec<(&str, String)> = vec![
        ("Config", report.meta.config_name.clone()),
        ("Engine version", report.meta.engine_version.clone()),
        ("Generated at", report.meta.run_at.clone()),
        ("Total orders", s.total_orders.to_string()),
        ("Total reservations", s.total_reservations.to_string()),
        ("Matched", s.matched.to_string()),
        ("Ambiguous", s.ambiguous.to_string()),
        ("Unmatched orders", s.unmatched_orders.to_string()),
        ("Unmatched reservations", s.unmatched_reservations.to_string()),
        ("Match rate %", format!("{:.1}", s.match_rate_pct)),
        ("Order amount", cents_to_major(s.order_amount_cents)),
        ("Matched amount", cents_to_major(s.matched_amount_cents)),
        ("Unmatched amount", cents_to_major(s.unmatched_amount_cents)),
    ];

    for (i, (metric, value)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, *metric)?;
        ws.write(r, 1, value.as_str())?;
    }

    let mut r = rows.len() as u32 + 2;
    ws.write_with_format(r, 0, "By date", header)?;
    r += 1;
    for (date, breakdown) in &s.by_date {
        ws.write(r, 0, date.as_str())?;
        ws.write(r, 1, format!("{} orders", breakdown.orders))?;
        ws.write(r, 2, format!("{} reservations", breakdown.reservations))?;
        ws.write(r, 3, format!("{} matched", breakdown.matched))?;
        r += 1;
    }

    Ok(())
}

fn write_warnings_sheet(ws: &mut Worksheet, report: &MatchReport, header: &Format) -> XlsxResult {
    ws.set_name("Warnings")?;
    write_header(ws, header, &["Source", "Row", "Field", "Raw Value", "Reason"])?;

    for (i, w) in report.warnings.iter().enumerate() {
        let r = i as u32 + 1;
        ws.write(r, 0, w.source.as_str())?;
        ws.write(r, 1, w.row as u32)?;
        ws.write(r, 2, w.field.as_str())?;
        ws.write(r, 3, w.raw_value.as_str())?;
        ws.write(r, 4, w.reason.as_str())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excel_round_trip_stringifies_cells() {
        let mut workbook = XlsxWorkbook::new();
        let ws = workbook.add_worksheet();
        ws.write(0, 0, "order_id").unwrap();
        ws.write(0, 1, "amount").unwrap();
        ws.write(1, 0, "mt_1001").unwrap();
        ws.write(1, 1, 256.0).unwrap();
        ws.write(2, 0, "mt_1002").unwrap();
        ws.write(2, 1, 88.5).unwrap();

        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        workbook.save(file.path()).unwrap();

        let table = read_table(file.path()).unwrap();
        assert_eq!(table.headers, vec!["order_id", "amount"]);
        assert_eq!(table.rows[0], vec!["mt_1001", "256"]);
        assert_eq!(table.rows[1], vec!["mt_1002", "88.5"]);
    }

    #[test]
    fn empty_sheet_yields_empty_table() {
        let mut workbook = XlsxWorkbook::new();
        workbook.add_worksheet();
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        workbook.save(file.path()).unwrap();

        let table = read_table(file.path()).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }
}
