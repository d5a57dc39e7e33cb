use std::collections::{HashMap, HashSet};

use crate::config::MatchConfig;
use crate::index::CandidateIndex;
use crate::model::{MatchCandidate, MatchedFields, OrderRecord, ReservationRecord};
use crate::score::score_pair;

/// A pair committed by the assignment pass.
#[derive(Debug, Clone)]
pub struct CommittedPair {
    pub order_idx: usize,
    pub reservation_idx: usize,
    pub score: f64,
    pub fields: MatchedFields,
}

/// An order whose best candidates tied within epsilon. Left unresolved
/// for human review; consumes nothing.
#[derive(Debug, Clone)]
pub struct AmbiguousOrder {
    pub order_idx: usize,
    pub top_score: f64,
    pub tied_reservation_idxs: Vec<usize>,
}

/// Assignment output plus the membership sets the partitioner needs for
/// reason tags.
#[derive(Debug, Default)]
pub struct Assignment {
    pub pairs: Vec<CommittedPair>,
    pub ambiguous: Vec<AmbiguousOrder>,
    pub candidate_orders: HashSet<usize>,
    pub candidate_reservations: HashSet<usize>,
    pub tied_reservations: HashSet<usize>,
}

/// Score every order against its index-bucketed candidates, keeping
/// those at or above `min_score`.
pub fn collect_candidates(
    orders: &[OrderRecord],
    reservations: &[ReservationRecord],
    index: &CandidateIndex,
    config: &MatchConfig,
) -> Vec<MatchCandidate> {
    let window = config.matching.date_window_days;
    let mut candidates = Vec::new();

    for (order_idx, order) in orders.iter().enumerate() {
        for reservation_idx in index.lookup(order, window) {
            let res = &reservations[reservation_idx];
            if let Some((score, fields)) = score_pair(order, res, &config.weights, window) {
                if score >= config.matching.min_score {
                    candidates.push(MatchCandidate {
                        order_idx,
                        reservation_idx,
                        score,
                        fields,
                    });
                }
            }
        }
    }

    candidates
}

/// Greedy one-to-one assignment by descending score.
///
/// Deterministic: candidates are ordered by (score desc, order id,
/// reservation id) using total float ordering, so identical inputs and
/// config always produce the same assignment.
///
/// Greedy rather than optimal (Hungarian) is deliberate: the result is
/// explainable pair by pair, and real duplicate-candidate collisions
/// are rare enough that they surface as ambiguity instead.
pub fn assign(
    mut candidates: Vec<MatchCandidate>,
    orders: &[OrderRecord],
    reservations: &[ReservationRecord],
    epsilon: f64,
) -> Assignment {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| orders[a.order_idx].id.cmp(&orders[b.order_idx].id))
            .then_with(|| {
                reservations[a.reservation_idx]
                    .id
                    .cmp(&reservations[b.reservation_idx].id)
            })
    });

    let mut out = Assignment::default();

    let mut per_order: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, c) in candidates.iter().enumerate() {
        out.candidate_orders.insert(c.order_idx);
        out.candidate_reservations.insert(c.reservation_idx);
        per_order.entry(c.order_idx).or_default().push(i);
    }

    let mut order_resolved: HashSet<usize> = HashSet::new();
    let mut reservation_used: HashSet<usize> = HashSet::new();

    for i in 0..candidates.len() {
        let c = &candidates[i];
        if order_resolved.contains(&c.order_idx) || reservation_used.contains(&c.reservation_idx) {
            continue;
        }

        // This is the order's best surviving candidate. A second
        // surviving candidate strictly within epsilon makes the order
        // ambiguous; epsilon = 0 turns the check off and exact ties
        // fall to the id tie-break.
        let tied: Vec<usize> = per_order[&c.order_idx]
            .iter()
            .map(|&ci| &candidates[ci])
            .filter(|cand| !reservation_used.contains(&cand.reservation_idx))
            .filter(|cand| c.score - cand.score < epsilon)
            .map(|cand| cand.reservation_idx)
            .collect();

        if tied.len() >= 2 {
            out.tied_reservations.extend(tied.iter().copied());
            out.ambiguous.push(AmbiguousOrder {
                order_idx: c.order_idx,
                top_score: c.score,
                tied_reservation_idxs: tied,
            });
            order_resolved.insert(c.order_idx);
            // Tied reservations stay available to later orders.
            continue;
        }

        out.pairs.push(CommittedPair {
            order_idx: c.order_idx,
            reservation_idx: c.reservation_idx,
            score: c.score,
            fields: c.fields,
        });
        order_resolved.insert(c.order_idx);
        reservation_used.insert(c.reservation_idx);
    }

    out
}
