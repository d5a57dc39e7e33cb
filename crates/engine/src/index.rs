use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};

use crate::model::{OrderRecord, ReservationRecord};

/// Candidate lookup index over reservations.
///
/// Buckets are keyed by (date, name-token initial) so each order scans
/// only reservations sharing a nearby date and at least one name-token
/// initial, instead of the full set.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    buckets: HashMap<(NaiveDate, char), Vec<usize>>,
}

fn token_initials(name_norm: &str) -> BTreeSet<char> {
    name_norm
        .split_whitespace()
        .filter_map(|tok| tok.chars().next())
        .collect()
}

impl CandidateIndex {
    pub fn build(reservations: &[ReservationRecord]) -> Self {
        let mut buckets: HashMap<(NaiveDate, char), Vec<usize>> = HashMap::new();
        for (idx, res) in reservations.iter().enumerate() {
            for initial in token_initials(&res.customer_norm) {
                buckets.entry((res.date, initial)).or_default().push(idx);
            }
        }
        Self { buckets }
    }

    /// Reservation indices sharing a date within the window and a
    /// name-token initial with the order. Deduped, ascending (so
    /// downstream iteration is deterministic).
    pub fn lookup(&self, order: &OrderRecord, date_window_days: u32) -> Vec<usize> {
        let mut found = BTreeSet::new();
        let window = date_window_days as i64;
        for offset in -window..=window {
            let date = order.date + Duration::days(offset);
            for initial in token_initials(&order.customer_norm) {
                if let Some(bucket) = self.buckets.get(&(date, initial)) {
                    found.extend(bucket.iter().copied());
                }
            }
        }
        found.into_iter().collect()
    }
}
