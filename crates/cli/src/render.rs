//! Plain-text rendering of match results and analytics for the terminal.

use std::fmt::Write;

use resmatch_engine::model::MatchedFields;
use resmatch_engine::{AnalysisSummary, MatchBucket, MatchReport};

fn fields_label(fields: &MatchedFields) -> String {
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

fn major(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Full per-record breakdown, one section per bucket.
pub fn render_results(report: &MatchReport) -> String {
    let mut out = String::new();
    let rows = |bucket: MatchBucket| report.outcomes.iter().filter(move |r| r.bucket == bucket);

    let matched: Vec<_> = rows(MatchBucket::Matched).collect();
    let _ = writeln!(out, "Matched ({})", matched.len());
    for row in matched {
        let _ = writeln!(
            out,
            "  {:<12} -> {:<12} score {:.3}  {}",
            row.order_id.as_deref().unwrap_or(""),
            row.reservation_id.as_deref().unwrap_or(""),
            row.score.unwrap_or(0.0),
            row.matched_fields.as_ref().map(fields_label).unwrap_or_default(),
        );
    }

    let ambiguous: Vec<_> = rows(MatchBucket::Ambiguous).collect();
    let _ = writeln!(out, "Ambiguous ({})", ambiguous.len());
    for row in ambiguous {
        let _ = writeln!(
            out,
            "  {:<12} score {:.3}  tied: {}",
            row.order_id.as_deref().unwrap_or(""),
            row.score.unwrap_or(0.0),
            row.tied_reservation_ids.join(", "),
        );
    }

    let orders: Vec<_> = rows(MatchBucket::UnmatchedOrder).collect();
    let _ = writeln!(out, "Unmatched orders ({})", orders.len());
    for row in orders {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            row.order_id.as_deref().unwrap_or(""),
            row.reason.map(|r| r.to_string()).unwrap_or_default(),
        );
    }

    let reservations: Vec<_> = rows(MatchBucket::UnmatchedReservation).collect();
    let _ = writeln!(out, "Unmatched reservations ({})", reservations.len());
    for row in reservations {
        let _ = writeln!(
            out,
            "  {:<12} {}",
            row.reservation_id.as_deref().unwrap_or(""),
            row.reason.map(|r| r.to_string()).unwrap_or_default(),
        );
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "Skipped rows ({})", report.warnings.len());
        for w in &report.warnings {
            let _ = writeln!(
                out,
                "  {} row {} [{}] {:?}: {}",
                w.source, w.row, w.field, w.raw_value, w.reason
            );
        }
    }

    out
}

/// Aggregate analytics view.
pub fn render_analysis(s: &AnalysisSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Orders:       {:<6} Reservations: {}", s.total_orders, s.total_reservations);
    let _ = writeln!(out, "Matched:      {:<6} ({:.1}%)", s.matched, s.match_rate_pct);
    let _ = writeln!(out, "Ambiguous:    {}", s.ambiguous);
    let _ = writeln!(
        out,
        "Unmatched:    {} orders, {} reservations",
        s.unmatched_orders, s.unmatched_reservations
    );
    let _ = writeln!(
        out,
        "Amount:       {} total, {} matched, {} unreconciled",
        major(s.order_amount_cents),
        major(s.matched_amount_cents),
        major(s.unmatched_amount_cents),
    );

    if !s.by_date.is_empty() {
        let _ = writeln!(out, "By date:");
        for (date, b) in &s.by_date {
            let _ = writeln!(
                out,
                "  {date}   {} orders, {} reservations, {} matched",
                b.orders, b.reservations, b.matched
            );
        }
    }
    if !s.by_channel.is_empty() {
        let _ = writeln!(out, "By channel:");
        for (channel, count) in &s.by_channel {
            let _ = writeln!(out, "  {channel:<12} {count}");
        }
    }

    out
}
