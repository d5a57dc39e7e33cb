use std::collections::BTreeSet;

use crate::config::Weights;
use crate::model::{MatchedFields, OrderRecord, ReservationRecord};

/// Name similarity at or above this is labeled a name match in the
/// matched-fields justification. Labeling only: candidate survival is
/// governed by the configured `min_score`, not this constant.
const NAME_MATCH_FLOOR: f64 = 0.85;

/// Broad sanity band for amount-per-head, in cents, feeding the
/// advisory amount component. Not a match gate: a miss lowers one
/// weighted component and clears the amount label, never the pair.
const PER_HEAD_MIN_CENTS: i64 = 500;
const PER_HEAD_MAX_CENTS: i64 = 200_000;

/// Similarity of folded names: the better of Jaro-Winkler (typo
/// distance) and token-set Jaccard (reordering, e.g. "wei li" vs
/// "li wei").
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let jw = strsim::jaro_winkler(a, b);

    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();
    let inter = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    let jaccard = if union == 0 { 0.0 } else { inter as f64 / union as f64 };

    jw.max(jaccard)
}

/// Score an order/reservation pair in [0,1].
///
/// Returns `None` when the pair is incompatible (dates outside the
/// window). Deterministic: pure function of the two records and config.
pub fn score_pair(
    order: &OrderRecord,
    res: &ReservationRecord,
    weights: &Weights,
    date_window_days: u32,
) -> Option<(f64, MatchedFields)> {
    let offset = (order.date - res.date).num_days().unsigned_abs();
    if offset > date_window_days as u64 {
        return None;
    }

    let mut fields = MatchedFields::default();

    let name = name_similarity(&order.customer_norm, &res.customer_norm);
    fields.name = name >= NAME_MATCH_FLOOR;

    // 1.0 on the exact date, linear decay across the window.
    let date = 1.0 - offset as f64 / (date_window_days as f64 + 1.0);
    fields.date = offset == 0;

    let time = match (&order.window, &res.window) {
        (Some(ow), Some(rw)) => {
            let overlap = ow.overlap_min(rw) as f64;
            let shorter = ow.duration_min().min(rw.duration_min()).max(1) as f64;
            let ratio = overlap / shorter;
            fields.time = overlap > 0.0;
            ratio
        }
        // Either side silent on time: neutral, neither bonus nor penalty.
        _ => 0.5,
    };

    let amount = match res.party_size {
        Some(party) if party > 0 && order.amount_cents > 0 => {
            let per_head = order.amount_cents / party as i64;
            let consistent = (PER_HEAD_MIN_CENTS..=PER_HEAD_MAX_CENTS).contains(&per_head);
            fields.amount = consistent;
            if consistent { 1.0 } else { 0.0 }
        }
        _ => 0.5,
    };

    let total = weights.total();
    let score = (weights.name * name
        + weights.date * date
        + weights.time * time
        + weights.amount * amount)
        / total;

    Some((score.clamp(0.0, 1.0), fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeWindow;
    use chrono::NaiveDate;

    fn order(name: &str, date: &str, window: Option<(u16, u16)>, amount: i64) -> OrderRecord {
        OrderRecord {
            id: "o1".into(),
            customer_raw: name.into(),
            customer_norm: crate::normalize::fold_name(name),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            window: window.map(|(s, e)| TimeWindow { start_min: s, end_min: e }),
            amount_cents: amount,
            channel: "meituan".into(),
            row: 1,
        }
    }

    fn res(name: &str, date: &str, window: Option<(u16, u16)>, party: Option<u32>) -> ReservationRecord {
        ReservationRecord {
            id: "r1".into(),
            customer_raw: name.into(),
            customer_norm: crate::normalize::fold_name(name),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            window: window.map(|(s, e)| TimeWindow { start_min: s, end_min: e }),
            party_size: party,
            status: "confirmed".into(),
            row: 1,
        }
    }

    #[test]
    fn name_similarity_cases() {
        assert_eq!(name_similarity("li wei", "li wei"), 1.0);
        // Token reorder caught by Jaccard
        assert_eq!(name_similarity("li wei", "wei li"), 1.0);
        assert!(name_similarity("li wei", "li we") > 0.85);
        assert!(name_similarity("li wei", "zhang san") < 0.6);
        assert_eq!(name_similarity("", "li wei"), 0.0);
    }

    #[test]
    fn same_name_same_date_overlapping_time_scores_high() {
        // Scenario A shape: "Li Wei" 18:00-19:00 vs "li wei" 18:00-20:00
        let o = order("Li Wei", "2025-01-10", Some((1080, 1140)), 25600);
        let r = res("li wei", "2025-01-10", Some((1080, 1200)), Some(4));
        let (score, fields) = score_pair(&o, &r, &Weights::default(), 1).unwrap();
        assert!(score >= 0.9, "got {score}");
        assert!(fields.name);
        assert!(fields.date);
        assert!(fields.time);
    }

    #[test]
    fn date_outside_window_incompatible() {
        let o = order("li wei", "2025-01-10", None, 10000);
        let r = res("li wei", "2025-01-13", None, None);
        assert!(score_pair(&o, &r, &Weights::default(), 1).is_none());
    }

    #[test]
    fn adjacent_date_decays() {
        let o = order("li wei", "2025-01-10", None, 10000);
        let same = res("li wei", "2025-01-10", None, None);
        let next = res("li wei", "2025-01-11", None, None);
        let w = Weights::default();
        let (s_same, f_same) = score_pair(&o, &same, &w, 1).unwrap();
        let (s_next, f_next) = score_pair(&o, &next, &w, 1).unwrap();
        assert!(s_same > s_next);
        assert!(f_same.date);
        assert!(!f_next.date);
    }

    #[test]
    fn disjoint_time_lowers_score() {
        let o = order("li wei", "2025-01-10", Some((720, 780)), 10000);
        let overlapping = res("li wei", "2025-01-10", Some((720, 840)), None);
        let disjoint = res("li wei", "2025-01-10", Some((1080, 1200)), None);
        let w = Weights::default();
        let (s_over, _) = score_pair(&o, &overlapping, &w, 1).unwrap();
        let (s_dis, f_dis) = score_pair(&o, &disjoint, &w, 1).unwrap();
        assert!(s_over > s_dis);
        assert!(!f_dis.time);
    }

    #[test]
    fn implausible_per_head_amount_penalized() {
        let o = order("li wei", "2025-01-10", None, 100);
        let plausible = res("li wei", "2025-01-10", None, None);
        let implausible = res("li wei", "2025-01-10", None, Some(40));
        let w = Weights::default();
        let (s_neutral, _) = score_pair(&o, &plausible, &w, 1).unwrap();
        let (s_bad, f_bad) = score_pair(&o, &implausible, &w, 1).unwrap();
        assert!(s_neutral > s_bad);
        assert!(!f_bad.amount);
    }

    #[test]
    fn amount_band_miss_never_drops_the_pair() {
        // Per-head far below the sanity band: the component scores 0
        // but the pair still comes back for min_score to judge.
        let o = order("li wei", "2025-01-10", None, 100);
        let r = res("li wei", "2025-01-10", None, Some(40));
        let (score, fields) = score_pair(&o, &r, &Weights::default(), 1).unwrap();
        assert!(score > 0.0);
        assert!(!fields.amount);
    }

    #[test]
    fn score_bounded() {
        let o = order("li wei", "2025-01-10", Some((1080, 1140)), 25600);
        let r = res("li wei", "2025-01-10", Some((1080, 1140)), Some(4));
        let (score, _) = score_pair(&o, &r, &Weights::default(), 0).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }
}
