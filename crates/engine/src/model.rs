use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A pre-loaded tabular input: header row plus string cells.
/// Produced by the IO layer (or `normalize::load_csv_table`).
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Half-open service window in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start_min: u16,
    pub end_min: u16,
}

impl TimeWindow {
    pub fn duration_min(&self) -> u16 {
        self.end_min.saturating_sub(self.start_min)
    }

    pub fn overlap_min(&self, other: &TimeWindow) -> u16 {
        let start = self.start_min.max(other.start_min);
        let end = self.end_min.min(other.end_min);
        end.saturating_sub(start)
    }
}

/// A normalized platform order. Immutable once ingested.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: String,
    pub customer_raw: String,
    pub customer_norm: String,
    pub date: NaiveDate,
    pub window: Option<TimeWindow>,
    pub amount_cents: i64,
    pub channel: String,
    /// 1-based data row in the source table, for audit/export.
    pub row: usize,
}

/// A normalized ledger reservation. Immutable once ingested.
#[derive(Debug, Clone)]
pub struct ReservationRecord {
    pub id: String,
    pub customer_raw: String,
    pub customer_norm: String,
    pub date: NaiveDate,
    pub window: Option<TimeWindow>,
    pub party_size: Option<u32>,
    pub status: String,
    pub row: usize,
}

/// A row dropped during ingest. Every skipped row surfaces here —
/// no silent data loss.
#[derive(Debug, Clone, Serialize)]
pub struct RowWarning {
    pub source: String,
    pub row: usize,
    pub field: String,
    pub raw_value: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Which score components contributed to a pairing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchedFields {
    pub name: bool,
    pub date: bool,
    pub time: bool,
    pub amount: bool,
}

/// Scored order/reservation pairing. Ephemeral: produced and consumed
/// inside the matcher.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub order_idx: usize,
    pub reservation_idx: usize,
    pub score: f64,
    pub fields: MatchedFields,
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBucket {
    Matched,
    Ambiguous,
    UnmatchedOrder,
    UnmatchedReservation,
}

impl std::fmt::Display for MatchBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::UnmatchedOrder => write!(f, "unmatched_order"),
            Self::UnmatchedReservation => write!(f, "unmatched_reservation"),
        }
    }
}

/// Why a record ended up unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// No candidate reached `min_score`.
    NoCandidate,
    /// Candidates existed but all were committed to other orders.
    CandidatesTaken,
    /// Part of a near-tie an ambiguous order refused to resolve.
    AmbiguousTie,
    /// Was a candidate but a better-scoring pairing won.
    NotSelected,
}

impl std::fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCandidate => write!(f, "no_candidate"),
            Self::CandidatesTaken => write!(f, "candidates_taken"),
            Self::AmbiguousTie => write!(f, "ambiguous_tie"),
            Self::NotSelected => write!(f, "not_selected"),
        }
    }
}

/// One row per input record: its bucket plus full justification.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRow {
    pub bucket: MatchBucket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_row: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_fields: Option<MatchedFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<UnmatchedReason>,
    /// Near-tied reservation ids, for ambiguous orders.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tied_reservation_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateBreakdown {
    pub orders: usize,
    pub reservations: usize,
    pub matched: usize,
}

/// Derived analytics. Pure function of the partition + raw records,
/// recomputed on demand and never independently mutated.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub total_orders: usize,
    pub total_reservations: usize,
    pub matched: usize,
    pub ambiguous: usize,
    pub unmatched_orders: usize,
    pub unmatched_reservations: usize,
    pub match_rate_pct: f64,
    pub order_amount_cents: i64,
    pub matched_amount_cents: i64,
    pub unmatched_amount_cents: i64,
    pub by_date: BTreeMap<String, DateBreakdown>,
    pub by_channel: BTreeMap<String, usize>,
    pub bucket_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchMeta {
    pub config_name: String,
    pub engine_version: String,
    /// Generation timestamp. The only non-deterministic report field;
    /// outcomes and summary are pure.
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub meta: MatchMeta,
    pub summary: AnalysisSummary,
    pub outcomes: Vec<OutcomeRow>,
    pub warnings: Vec<RowWarning>,
}
