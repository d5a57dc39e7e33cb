use std::fmt;

#[derive(Debug)]
pub enum MatchError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad weights, empty mapping, etc.).
    ConfigValidation(String),
    /// Required columns absent from an input table. Fatal to ingest.
    MissingColumns { source: String, columns: Vec<String> },
    /// Partition invariant broken. Internal defect, never expected
    /// from valid input.
    Invariant(String),
    /// Session used out of order (matching before files are loaded).
    Session(String),
    /// Report serialization / export failure. The match result itself
    /// remains valid and re-exportable.
    Export(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumns { source, columns } => {
                write!(f, "source '{source}': missing column(s) {}", columns.join(", "))
            }
            Self::Invariant(msg) => write!(f, "partition invariant violated: {msg}"),
            Self::Session(msg) => write!(f, "session error: {msg}"),
            Self::Export(msg) => write!(f, "export error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}
