use std::collections::{BTreeMap, HashMap};

use crate::model::{
    AnalysisSummary, DateBreakdown, MatchBucket, OrderRecord, OutcomeRow, ReservationRecord,
};

/// Compute summary analytics from the partition.
///
/// Pure function of the outcome rows plus the raw records; recomputed on
/// demand, never cached. Ambiguous orders count as unreconciled revenue.
pub fn compute_summary(
    outcomes: &[OutcomeRow],
    orders: &[OrderRecord],
    reservations: &[ReservationRecord],
) -> AnalysisSummary {
    let order_by_id: HashMap<&str, &OrderRecord> =
        orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut matched = 0;
    let mut ambiguous = 0;
    let mut unmatched_orders = 0;
    let mut unmatched_reservations = 0;
    let mut matched_amount_cents = 0i64;
    let mut bucket_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_date: BTreeMap<String, DateBreakdown> = BTreeMap::new();
    let mut by_channel: BTreeMap<String, usize> = BTreeMap::new();

    for order in orders {
        by_date.entry(order.date.to_string()).or_default().orders += 1;
        *by_channel.entry(order.channel.clone()).or_insert(0) += 1;
    }
    for res in reservations {
        by_date.entry(res.date.to_string()).or_default().reservations += 1;
    }

    for row in outcomes {
        *bucket_counts.entry(row.bucket.to_string()).or_insert(0) += 1;
        match row.bucket {
            MatchBucket::Matched => {
                matched += 1;
                if let Some(order) = row.order_id.as_deref().and_then(|id| order_by_id.get(id)) {
                    matched_amount_cents += order.amount_cents;
                    by_date.entry(order.date.to_string()).or_default().matched += 1;
                }
            }
            MatchBucket::Ambiguous => ambiguous += 1,
            MatchBucket::UnmatchedOrder => unmatched_orders += 1,
            MatchBucket::UnmatchedReservation => unmatched_reservations += 1,
        }
    }

    let order_amount_cents: i64 = orders.iter().map(|o| o.amount_cents).sum();
    let match_rate_pct = if orders.is_empty() {
        0.0
    } else {
        matched as f64 / orders.len() as f64 * 100.0
    };

    AnalysisSummary {
        total_orders: orders.len(),
        total_reservations: reservations.len(),
        matched,
        ambiguous,
        unmatched_orders,
        unmatched_reservations,
        match_rate_pct,
        order_amount_cents,
        matched_amount_cents,
        unmatched_amount_cents: order_amount_cents - matched_amount_cents,
        by_date,
        by_channel,
        bucket_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeWindow;
    use chrono::NaiveDate;

    fn order(id: &str, date: &str, amount: i64, channel: &str) -> OrderRecord {
        OrderRecord {
            id: id.into(),
            customer_raw: "Li Wei".into(),
            customer_norm: "li wei".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            window: Some(TimeWindow { start_min: 1080, end_min: 1140 }),
            amount_cents: amount,
            channel: channel.into(),
            row: 1,
        }
    }

    fn res(id: &str, date: &str) -> ReservationRecord {
        ReservationRecord {
            id: id.into(),
            customer_raw: "Li Wei".into(),
            customer_norm: "li wei".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            window: None,
            party_size: None,
            status: "confirmed".into(),
            row: 1,
        }
    }

    fn outcome(bucket: MatchBucket, order_id: Option<&str>, res_id: Option<&str>) -> OutcomeRow {
        OutcomeRow {
            bucket,
            order_id: order_id.map(String::from),
            reservation_id: res_id.map(String::from),
            order_row: None,
            reservation_row: None,
            score: None,
            matched_fields: None,
            reason: None,
            tied_reservation_ids: Vec::new(),
        }
    }

    #[test]
    fn counts_and_amounts() {
        let orders = vec![
            order("o1", "2025-01-10", 25600, "meituan"),
            order("o2", "2025-01-10", 10000, "walk-in"),
            order("o3", "2025-01-11", 5000, "meituan"),
        ];
        let reservations = vec![res("r1", "2025-01-10"), res("r2", "2025-01-11")];
        let outcomes = vec![
            outcome(MatchBucket::Matched, Some("o1"), Some("r1")),
            outcome(MatchBucket::UnmatchedOrder, Some("o2"), None),
            outcome(MatchBucket::Ambiguous, Some("o3"), None),
            outcome(MatchBucket::UnmatchedReservation, None, Some("r2")),
        ];

        let s = compute_summary(&outcomes, &orders, &reservations);
        assert_eq!(s.total_orders, 3);
        assert_eq!(s.total_reservations, 2);
        assert_eq!(s.matched, 1);
        assert_eq!(s.ambiguous, 1);
        assert_eq!(s.unmatched_orders, 1);
        assert_eq!(s.unmatched_reservations, 1);
        assert!((s.match_rate_pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.order_amount_cents, 40600);
        assert_eq!(s.matched_amount_cents, 25600);
        assert_eq!(s.unmatched_amount_cents, 15000);
        assert_eq!(s.by_channel["meituan"], 2);
        assert_eq!(s.by_date["2025-01-10"].orders, 2);
        assert_eq!(s.by_date["2025-01-10"].matched, 1);
        assert_eq!(s.by_date["2025-01-11"].reservations, 1);
        assert_eq!(s.bucket_counts["matched"], 1);
    }

    #[test]
    fn empty_input_is_zeroed() {
        let s = compute_summary(&[], &[], &[]);
        assert_eq!(s.total_orders, 0);
        assert_eq!(s.match_rate_pct, 0.0);
        assert!(s.by_date.is_empty());
    }
}
