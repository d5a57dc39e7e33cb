//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                         |
//! |------|-------------------------------------------------|
//! | 0    | Success - clean match, nothing left over        |
//! | 1    | General error (unspecified)                     |
//! | 2    | CLI usage error (bad args, unknown tool)        |
//! | 3    | Invalid config (parse or validation failure)    |
//! | 4    | Unmatched records present (or ambiguous with    |
//! |      | `fail_on_ambiguous` set)                        |
//! | 5    | Ambiguous matches present                       |
//! | 6    | Runtime error (IO, missing columns, export)     |

/// Success - command completed and the match was clean.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown tool id.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Unmatched orders or reservations remain after matching.
/// Also raised for ambiguous matches when `fail_on_ambiguous` is set.
pub const EXIT_MISMATCH: u8 = 4;

/// Ambiguous matches present (and `fail_on_ambiguous` not set).
/// Softer than a mismatch: the records exist, the pairing is unclear.
pub const EXIT_AMBIGUOUS: u8 = 5;

/// Runtime failure - unreadable input, missing columns, export error.
pub const EXIT_RUNTIME: u8 = 6;
