//! Static tool registry.
//!
//! Tools are resolved through a compile-time id → constructor map instead
//! of runtime reflection: an unknown id is a usage error at startup, not a
//! dispatch failure halfway through a run.

use resmatch_engine::{MatchConfig, MatchSession};

pub struct ToolEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(MatchConfig) -> MatchSession,
}

pub const TOOLS: &[ToolEntry] = &[ToolEntry {
    id: "order_match",
    name: "Order / Reservation Matcher",
    description: "Reconciles platform orders against a reservation ledger",
    build: MatchSession::new,
}];

pub const DEFAULT_TOOL: &str = "order_match";

pub fn lookup(id: &str) -> Option<&'static ToolEntry> {
    TOOLS.iter().find(|t| t.id == id)
}
