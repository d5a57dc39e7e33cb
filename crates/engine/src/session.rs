use crate::config::MatchConfig;
use crate::engine::{run, MatchInput};
use crate::error::MatchError;
use crate::model::{AnalysisSummary, MatchReport, RawTable};

/// Host-facing facade over one matching session.
///
/// The hosting layer (portal, CLI) feeds it pre-loaded tables and pulls
/// results; loading a new file pair discards the previous result.
/// Records live only for the duration of the session — nothing persists
/// beyond what the exporter writes out.
pub struct MatchSession {
    config: MatchConfig,
    input: Option<MatchInput>,
    report: Option<MatchReport>,
}

impl MatchSession {
    pub fn new(config: MatchConfig) -> Self {
        Self { config, input: None, report: None }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Stage a new file pair. Any previous result is discarded.
    pub fn load_files(&mut self, orders: RawTable, reservations: RawTable) {
        self.input = Some(MatchInput { orders, reservations });
        self.report = None;
    }

    /// Cheap readiness check for the host to surface before matching.
    pub fn validate_files(&self) -> Result<(), String> {
        let Some(ref input) = self.input else {
            return Err("no files loaded".into());
        };
        if input.orders.headers.is_empty() {
            return Err("orders file has no header row".into());
        }
        if input.reservations.headers.is_empty() {
            return Err("reservations file has no header row".into());
        }
        Ok(())
    }

    /// Run the pipeline; returns a human-readable result message.
    pub fn match_data(&mut self) -> Result<String, MatchError> {
        self.validate_files().map_err(MatchError::Session)?;
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| MatchError::Session("no files loaded".into()))?;

        let report = run(&self.config, input)?;
        let s = &report.summary;
        let message = format!(
            "matched {} of {} orders ({:.1}%), {} ambiguous, {} unmatched reservations, {} rows skipped",
            s.matched,
            s.total_orders,
            s.match_rate_pct,
            s.ambiguous,
            s.unmatched_reservations,
            report.warnings.len(),
        );
        self.report = Some(report);
        Ok(message)
    }

    /// The full partitioned result of the last `match_data` call.
    pub fn report(&self) -> Option<&MatchReport> {
        self.report.as_ref()
    }

    pub fn data_analysis(&self) -> Option<&AnalysisSummary> {
        self.report.as_ref().map(|r| &r.summary)
    }
}
