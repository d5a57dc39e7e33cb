use crate::config::MatchConfig;
use crate::error::MatchError;
use crate::index::CandidateIndex;
use crate::matcher::{assign, collect_candidates};
use crate::model::{MatchMeta, MatchReport, RawTable};
use crate::normalize::normalize_sources;
use crate::partition::partition;
use crate::summary::compute_summary;

/// Pre-loaded raw tables for one matching session.
pub struct MatchInput {
    pub orders: RawTable,
    pub reservations: RawTable,
}

/// Run the full pipeline: normalize → index → score → assign →
/// partition → summarize.
///
/// Synchronous and stateless; apart from `meta.run_at` the report is a
/// pure function of config + input.
pub fn run(config: &MatchConfig, input: &MatchInput) -> Result<MatchReport, MatchError> {
    let normalized = normalize_sources(&input.orders, &input.reservations, config)?;

    let index = CandidateIndex::build(&normalized.reservations);
    let candidates =
        collect_candidates(&normalized.orders, &normalized.reservations, &index, config);
    let assignment = assign(
        candidates,
        &normalized.orders,
        &normalized.reservations,
        config.matching.epsilon,
    );

    let outcomes = partition(&normalized.orders, &normalized.reservations, &assignment)?;
    let summary = compute_summary(&outcomes, &normalized.orders, &normalized.reservations);

    Ok(MatchReport {
        meta: MatchMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        outcomes,
        warnings: normalized.warnings,
    })
}
