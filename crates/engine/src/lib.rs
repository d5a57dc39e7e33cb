//! `resmatch-engine` — Deterministic order/reservation matching engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns a partitioned
//! match report. No UI or file-format dependencies beyond a CSV helper.

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod partition;
pub mod score;
pub mod session;
pub mod summary;

pub use config::MatchConfig;
pub use engine::{run, MatchInput};
pub use error::MatchError;
pub use model::{AnalysisSummary, MatchBucket, MatchReport, OutcomeRow, RawTable};
pub use session::MatchSession;
