use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::{MatchConfig, OrderColumns, ReservationColumns};
use crate::error::MatchError;
use crate::model::{OrderRecord, RawTable, ReservationRecord, RowWarning, TimeWindow};

/// Output of ingest: canonical record sets plus every skipped row.
#[derive(Debug, Default)]
pub struct NormalizedInput {
    pub orders: Vec<OrderRecord>,
    pub reservations: Vec<ReservationRecord>,
    pub warnings: Vec<RowWarning>,
}

/// Fold a customer name for fuzzy comparison: trim, lowercase,
/// strip punctuation, collapse whitespace.
pub fn fold_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() {
            out.push(' ');
        }
        // punctuation dropped
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Try each configured format in order.
fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_clock(value: &str) -> Option<u16> {
    let (h, m) = value.trim().split_once(':')?;
    let h: u16 = h.trim().parse().ok()?;
    let m: u16 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Parse a service window. Accepts `HH:MM-HH:MM` (also `~` as separator)
/// and bare `HH:MM`, which becomes a one-minute window so containment
/// scoring works. An end before the start is taken to cross midnight
/// (`22:00-01:00` runs to 25:00). Empty input is a valid absent window.
pub fn parse_window(value: &str) -> Result<Option<TimeWindow>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let sep = ['-', '~'];
    if let Some((start, end)) = value.split_once(sep) {
        let start_min = parse_clock(start).ok_or("bad start time")?;
        let mut end_min = parse_clock(end).ok_or("bad end time")?;
        if end_min == start_min {
            return Err("window end equals start".into());
        }
        if end_min < start_min {
            end_min += 24 * 60;
        }
        Ok(Some(TimeWindow { start_min, end_min }))
    } else {
        let start_min = parse_clock(value).ok_or("bad time")?;
        Ok(Some(TimeWindow { start_min, end_min: start_min + 1 }))
    }
}

/// Parse a decimal major-unit amount to cents. Currency symbols and
/// thousands separators are stripped.
pub fn parse_amount_cents(value: &str) -> Option<i64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let negative = cleaned.starts_with('-');
    let body = cleaned.trim_start_matches('-');
    let (whole, frac) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac[..2].parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(frac_cents)?;
    Some(if negative { -cents } else { cents })
}

/// Resolve all mapped columns, reporting every missing one at once.
fn resolve_columns(
    source: &str,
    headers: &[String],
    wanted: &[(&str, &str)],
) -> Result<Vec<usize>, MatchError> {
    let mut indices = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for (_, column) in wanted {
        match headers.iter().position(|h| h == column) {
            Some(i) => indices.push(i),
            None => missing.push((*column).to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(MatchError::MissingColumns {
            source: source.into(),
            columns: missing,
        });
    }
    Ok(indices)
}

/// Parse both raw tables into canonical record sets.
///
/// Missing columns are fatal; unparseable rows are skipped and collected
/// as warnings (partial-failure tolerant ingest).
pub fn normalize_sources(
    orders: &RawTable,
    reservations: &RawTable,
    config: &MatchConfig,
) -> Result<NormalizedInput, MatchError> {
    let mut out = NormalizedInput::default();
    normalize_orders(orders, config, &mut out)?;
    normalize_reservations(reservations, config, &mut out)?;
    Ok(out)
}

fn normalize_orders(
    table: &RawTable,
    config: &MatchConfig,
    out: &mut NormalizedInput,
) -> Result<(), MatchError> {
    let col: &OrderColumns = &config.sources.orders.columns;
    let wanted = [
        ("id", col.id.as_str()),
        ("customer", col.customer.as_str()),
        ("date", col.date.as_str()),
        ("time", col.time.as_str()),
        ("amount", col.amount.as_str()),
        ("channel", col.channel.as_str()),
    ];
    let idx = resolve_columns("orders", &table.headers, &wanted)?;
    let formats = &config.sources.orders.date_formats;

    let mut seen_ids: HashSet<String> = HashSet::new();

    for (i, cells) in table.rows.iter().enumerate() {
        let row = i + 1;
        let get = |c: usize| cells.get(idx[c]).map(String::as_str).unwrap_or("");
        let mut warn = |field: &str, raw: &str, reason: &str| {
            out.warnings.push(RowWarning {
                source: "orders".into(),
                row,
                field: field.into(),
                raw_value: raw.into(),
                reason: reason.into(),
            });
        };

        let id = get(0).trim().to_string();
        if id.is_empty() {
            warn("id", "", "empty order id");
            continue;
        }
        if !seen_ids.insert(id.clone()) {
            warn("id", &id, "duplicate order id");
            continue;
        }

        let customer_raw = get(1).trim().to_string();
        let customer_norm = fold_name(&customer_raw);
        if customer_norm.is_empty() {
            warn("customer", &customer_raw, "empty customer name");
            continue;
        }

        let date_raw = get(2);
        let Some(date) = parse_date(date_raw, formats) else {
            warn("date", date_raw, "unparseable date");
            continue;
        };

        let time_raw = get(3);
        let window = match parse_window(time_raw) {
            Ok(w) => w,
            Err(reason) => {
                warn("time", time_raw, &reason);
                continue;
            }
        };

        let amount_raw = get(4);
        let Some(amount_cents) = parse_amount_cents(amount_raw) else {
            warn("amount", amount_raw, "unparseable amount");
            continue;
        };

        out.orders.push(OrderRecord {
            id,
            customer_raw,
            customer_norm,
            date,
            window,
            amount_cents,
            channel: get(5).trim().to_string(),
            row,
        });
    }

    Ok(())
}

fn normalize_reservations(
    table: &RawTable,
    config: &MatchConfig,
    out: &mut NormalizedInput,
) -> Result<(), MatchError> {
    let col: &ReservationColumns = &config.sources.reservations.columns;
    let wanted = [
        ("id", col.id.as_str()),
        ("customer", col.customer.as_str()),
        ("date", col.date.as_str()),
        ("time", col.time.as_str()),
        ("party_size", col.party_size.as_str()),
        ("status", col.status.as_str()),
    ];
    let idx = resolve_columns("reservations", &table.headers, &wanted)?;
    let formats = &config.sources.reservations.date_formats;

    let mut seen_ids: HashSet<String> = HashSet::new();

    for (i, cells) in table.rows.iter().enumerate() {
        let row = i + 1;
        let get = |c: usize| cells.get(idx[c]).map(String::as_str).unwrap_or("");
        let mut warn = |field: &str, raw: &str, reason: &str| {
            out.warnings.push(RowWarning {
                source: "reservations".into(),
                row,
                field: field.into(),
                raw_value: raw.into(),
                reason: reason.into(),
            });
        };

        let id = get(0).trim().to_string();
        if id.is_empty() {
            warn("id", "", "empty reservation id");
            continue;
        }
        if !seen_ids.insert(id.clone()) {
            warn("id", &id, "duplicate reservation id");
            continue;
        }

        let customer_raw = get(1).trim().to_string();
        let customer_norm = fold_name(&customer_raw);
        if customer_norm.is_empty() {
            warn("customer", &customer_raw, "empty customer name");
            continue;
        }

        let date_raw = get(2);
        let Some(date) = parse_date(date_raw, formats) else {
            warn("date", date_raw, "unparseable date");
            continue;
        };

        let time_raw = get(3);
        let window = match parse_window(time_raw) {
            Ok(w) => w,
            Err(reason) => {
                warn("time", time_raw, &reason);
                continue;
            }
        };

        let party_raw = get(4).trim();
        let party_size = if party_raw.is_empty() {
            None
        } else {
            match party_raw.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    warn("party_size", party_raw, "unparseable party size");
                    continue;
                }
            }
        };

        out.reservations.push(ReservationRecord {
            id,
            customer_raw,
            customer_norm,
            date,
            window,
            party_size,
            status: get(5).trim().to_string(),
            row,
        });
    }

    Ok(())
}

/// Parse CSV text into a RawTable (first record is the header row).
pub fn load_csv_table(data: &str) -> Result<RawTable, MatchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;

    const CONFIG: &str = r#"
name = "Test"

[sources.orders]
file = "orders.csv"
[sources.orders.columns]
id       = "order_id"
customer = "customer"
date     = "order_date"
time     = "slot"
amount   = "amount"
channel  = "channel"

[sources.reservations]
file = "reservations.csv"
[sources.reservations.columns]
id         = "res_id"
customer   = "guest"
date       = "res_date"
time       = "slot"
party_size = "party"
status     = "status"
"#;

    fn config() -> MatchConfig {
        MatchConfig::from_toml(CONFIG).unwrap()
    }

    fn orders_table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: ["order_id", "customer", "order_date", "slot", "amount", "channel"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn reservations_table(rows: &[&[&str]]) -> RawTable {
        RawTable {
            headers: ["res_id", "guest", "res_date", "slot", "party", "status"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn fold_name_basic() {
        assert_eq!(fold_name("  Li Wei "), "li wei");
        assert_eq!(fold_name("O'Brien, Mary-Jane"), "obrien maryjane");
        assert_eq!(fold_name("王芳"), "王芳");
        assert_eq!(fold_name("  WANG   Fang "), "wang fang");
    }

    #[test]
    fn date_multi_format() {
        let formats: Vec<String> =
            vec!["%Y-%m-%d".into(), "%Y/%m/%d".into(), "%Y年%m月%d日".into()];
        let expect = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(parse_date("2025-01-10", &formats), Some(expect));
        assert_eq!(parse_date("2025/01/10", &formats), Some(expect));
        assert_eq!(parse_date("2025年01月10日", &formats), Some(expect));
        assert_eq!(parse_date("Jan 10", &formats), None);
    }

    #[test]
    fn window_forms() {
        let w = parse_window("18:00-19:30").unwrap().unwrap();
        assert_eq!((w.start_min, w.end_min), (18 * 60, 19 * 60 + 30));

        let w = parse_window("18:00~20:00").unwrap().unwrap();
        assert_eq!((w.start_min, w.end_min), (18 * 60, 20 * 60));

        // Bare time becomes a one-minute window
        let w = parse_window("18:30").unwrap().unwrap();
        assert_eq!((w.start_min, w.end_min), (18 * 60 + 30, 18 * 60 + 31));

        // Overnight service wraps past midnight
        let w = parse_window("22:00-01:00").unwrap().unwrap();
        assert_eq!((w.start_min, w.end_min), (22 * 60, 25 * 60));

        assert_eq!(parse_window("").unwrap(), None);
        assert!(parse_window("18:00-18:00").is_err());
        assert!(parse_window("25:00").is_err());
    }

    #[test]
    fn overnight_window_row_survives_ingest() {
        let orders = orders_table(&[
            &["o1", "Li Wei", "2025-01-10", "22:00-01:00", "256.00", "meituan"],
        ]);
        let reservations = reservations_table(&[]);
        let out = normalize_sources(&orders, &reservations, &config()).unwrap();
        assert_eq!(out.orders.len(), 1);
        assert!(out.warnings.is_empty());
        let w = out.orders[0].window.unwrap();
        assert_eq!((w.start_min, w.end_min), (1320, 1500));
    }

    #[test]
    fn amount_forms() {
        assert_eq!(parse_amount_cents("128"), Some(12800));
        assert_eq!(parse_amount_cents("128.5"), Some(12850));
        assert_eq!(parse_amount_cents("128.50"), Some(12850));
        assert_eq!(parse_amount_cents("¥1,280.00"), Some(128000));
        assert_eq!(parse_amount_cents("-12.00"), Some(-1200));
        assert_eq!(parse_amount_cents("n/a"), None);
    }

    #[test]
    fn normalize_happy_path() {
        let orders = orders_table(&[
            &["o1", "Li Wei", "2025-01-10", "18:00-19:00", "256.00", "meituan"],
        ]);
        let reservations = reservations_table(&[
            &["r1", "li wei", "2025-01-10", "18:00-20:00", "4", "confirmed"],
        ]);
        let out = normalize_sources(&orders, &reservations, &config()).unwrap();
        assert_eq!(out.orders.len(), 1);
        assert_eq!(out.reservations.len(), 1);
        assert!(out.warnings.is_empty());
        assert_eq!(out.orders[0].customer_norm, "li wei");
        assert_eq!(out.orders[0].amount_cents, 25600);
        assert_eq!(out.reservations[0].party_size, Some(4));
    }

    #[test]
    fn missing_columns_reported_at_once() {
        let orders = RawTable {
            headers: vec!["order_id".into(), "customer".into()],
            rows: vec![],
        };
        let reservations = reservations_table(&[]);
        let err = normalize_sources(&orders, &reservations, &config()).unwrap_err();
        match err {
            MatchError::MissingColumns { source, columns } => {
                assert_eq!(source, "orders");
                assert_eq!(columns, vec!["order_date", "slot", "amount", "channel"]);
            }
            other => panic!("expected MissingColumns, got {other}"),
        }
    }

    #[test]
    fn bad_date_row_skipped_with_warning() {
        let orders = orders_table(&[
            &["o1", "Li Wei", "not-a-date", "18:00", "100", "meituan"],
            &["o2", "Wang Fang", "2025-01-10", "18:00", "100", "meituan"],
        ]);
        let reservations = reservations_table(&[]);
        let out = normalize_sources(&orders, &reservations, &config()).unwrap();
        assert_eq!(out.orders.len(), 1);
        assert_eq!(out.orders[0].id, "o2");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].row, 1);
        assert_eq!(out.warnings[0].field, "date");
        assert_eq!(out.warnings[0].raw_value, "not-a-date");
    }

    #[test]
    fn duplicate_id_skipped() {
        let orders = orders_table(&[
            &["o1", "Li Wei", "2025-01-10", "", "100", "a"],
            &["o1", "Li Wei", "2025-01-10", "", "100", "a"],
        ]);
        let reservations = reservations_table(&[]);
        let out = normalize_sources(&orders, &reservations, &config()).unwrap();
        assert_eq!(out.orders.len(), 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].reason.contains("duplicate"));
    }

    #[test]
    fn load_csv_basic() {
        let csv = "order_id,customer,order_date\no1,Li Wei,2025-01-10\n";
        let table = load_csv_table(csv).unwrap();
        assert_eq!(table.headers, vec!["order_id", "customer", "order_date"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Li Wei");
    }
}
