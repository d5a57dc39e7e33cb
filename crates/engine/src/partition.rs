use std::collections::HashMap;

use crate::error::MatchError;
use crate::matcher::Assignment;
use crate::model::{
    MatchBucket, OrderRecord, OutcomeRow, ReservationRecord, UnmatchedReason,
};

/// Classify every input record into exactly one outcome bucket.
///
/// Pure function of the records and the assignment. Order-side rows come
/// first in input order, then the remaining reservation-side rows in
/// input order. The exhaustive/disjoint invariant is verified before
/// returning; a violation is an internal defect, never expected from
/// valid input.
pub fn partition(
    orders: &[OrderRecord],
    reservations: &[ReservationRecord],
    assignment: &Assignment,
) -> Result<Vec<OutcomeRow>, MatchError> {
    let mut by_order: HashMap<usize, &crate::matcher::CommittedPair> = HashMap::new();
    let mut by_reservation: HashMap<usize, usize> = HashMap::new();

    for pair in &assignment.pairs {
        if pair.order_idx >= orders.len() || pair.reservation_idx >= reservations.len() {
            return Err(MatchError::Invariant(format!(
                "pair references out-of-range record ({}, {})",
                pair.order_idx, pair.reservation_idx
            )));
        }
        if by_order.insert(pair.order_idx, pair).is_some() {
            return Err(MatchError::Invariant(format!(
                "order '{}' committed twice",
                orders[pair.order_idx].id
            )));
        }
        if by_reservation.insert(pair.reservation_idx, pair.order_idx).is_some() {
            return Err(MatchError::Invariant(format!(
                "reservation '{}' committed twice",
                reservations[pair.reservation_idx].id
            )));
        }
    }

    let mut ambiguous_by_order: HashMap<usize, &crate::matcher::AmbiguousOrder> = HashMap::new();
    for amb in &assignment.ambiguous {
        if by_order.contains_key(&amb.order_idx) {
            return Err(MatchError::Invariant(format!(
                "order '{}' both matched and ambiguous",
                orders[amb.order_idx].id
            )));
        }
        if ambiguous_by_order.insert(amb.order_idx, amb).is_some() {
            return Err(MatchError::Invariant(format!(
                "order '{}' flagged ambiguous twice",
                orders[amb.order_idx].id
            )));
        }
    }

    let mut rows = Vec::with_capacity(orders.len() + reservations.len());

    for (order_idx, order) in orders.iter().enumerate() {
        if let Some(pair) = by_order.get(&order_idx) {
            let res = &reservations[pair.reservation_idx];
            rows.push(OutcomeRow {
                bucket: MatchBucket::Matched,
                order_id: Some(order.id.clone()),
                reservation_id: Some(res.id.clone()),
                order_row: Some(order.row),
                reservation_row: Some(res.row),
                score: Some(pair.score),
                matched_fields: Some(pair.fields),
                reason: None,
                tied_reservation_ids: Vec::new(),
            });
        } else if let Some(amb) = ambiguous_by_order.get(&order_idx) {
            let mut tied_ids: Vec<String> = amb
                .tied_reservation_idxs
                .iter()
                .map(|&i| reservations[i].id.clone())
                .collect();
            tied_ids.sort();
            rows.push(OutcomeRow {
                bucket: MatchBucket::Ambiguous,
                order_id: Some(order.id.clone()),
                reservation_id: None,
                order_row: Some(order.row),
                reservation_row: None,
                score: Some(amb.top_score),
                matched_fields: None,
                reason: None,
                tied_reservation_ids: tied_ids,
            });
        } else {
            let reason = if assignment.candidate_orders.contains(&order_idx) {
                UnmatchedReason::CandidatesTaken
            } else {
                UnmatchedReason::NoCandidate
            };
            rows.push(OutcomeRow {
                bucket: MatchBucket::UnmatchedOrder,
                order_id: Some(order.id.clone()),
                reservation_id: None,
                order_row: Some(order.row),
                reservation_row: None,
                score: None,
                matched_fields: None,
                reason: Some(reason),
                tied_reservation_ids: Vec::new(),
            });
        }
    }

    for (res_idx, res) in reservations.iter().enumerate() {
        if by_reservation.contains_key(&res_idx) {
            continue; // already covered by its matched row
        }
        let reason = if assignment.tied_reservations.contains(&res_idx) {
            UnmatchedReason::AmbiguousTie
        } else if assignment.candidate_reservations.contains(&res_idx) {
            UnmatchedReason::NotSelected
        } else {
            UnmatchedReason::NoCandidate
        };
        rows.push(OutcomeRow {
            bucket: MatchBucket::UnmatchedReservation,
            order_id: None,
            reservation_id: Some(res.id.clone()),
            order_row: None,
            reservation_row: Some(res.row),
            score: None,
            matched_fields: None,
            reason: Some(reason),
            tied_reservation_ids: Vec::new(),
        });
    }

    verify_partition(orders, reservations, &rows)?;
    Ok(rows)
}

/// Exhaustive/disjoint check: every order id and reservation id appears
/// in exactly one bucket.
fn verify_partition(
    orders: &[OrderRecord],
    reservations: &[ReservationRecord],
    rows: &[OutcomeRow],
) -> Result<(), MatchError> {
    let mut order_seen: HashMap<&str, usize> = HashMap::new();
    let mut res_seen: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        if let Some(ref id) = row.order_id {
            *order_seen.entry(id.as_str()).or_insert(0) += 1;
        }
        if let Some(ref id) = row.reservation_id {
            *res_seen.entry(id.as_str()).or_insert(0) += 1;
        }
    }

    for order in orders {
        match order_seen.get(order.id.as_str()) {
            Some(1) => {}
            Some(n) => {
                return Err(MatchError::Invariant(format!(
                    "order '{}' appears in {n} buckets",
                    order.id
                )))
            }
            None => {
                return Err(MatchError::Invariant(format!(
                    "order '{}' missing from partition",
                    order.id
                )))
            }
        }
    }
    for res in reservations {
        match res_seen.get(res.id.as_str()) {
            Some(1) => {}
            Some(n) => {
                return Err(MatchError::Invariant(format!(
                    "reservation '{}' appears in {n} buckets",
                    res.id
                )))
            }
            None => {
                return Err(MatchError::Invariant(format!(
                    "reservation '{}' missing from partition",
                    res.id
                )))
            }
        }
    }

    Ok(())
}
