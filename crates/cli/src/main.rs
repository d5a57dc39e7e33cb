// resmatch CLI - config-driven order/reservation matching

mod exit_codes;
mod registry;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use resmatch_engine::{AnalysisSummary, MatchConfig, MatchError};
use resmatch_io::{export, read_table, ExportFormat};

use exit_codes::{
    EXIT_AMBIGUOUS, EXIT_INVALID_CONFIG, EXIT_MISMATCH, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "resmatch")]
#[command(about = "Deterministic order/reservation reconciliation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a match from a TOML config file
    #[command(after_help = "\
Examples:
  resmatch run match.toml
  resmatch run match.toml --json
  resmatch run match.toml --output result.json --export report.xlsx
  resmatch run match.toml --analysis")]
    Run {
        /// Path to the match config file
        config: PathBuf,

        /// Output the full report as JSON to stdout instead of tables
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export the report (format from extension: .xlsx, .csv, .json)
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the aggregate analysis after the per-record tables
        #[arg(long)]
        analysis: bool,

        /// Tool id to run (see `resmatch tools`)
        #[arg(long, default_value = registry::DEFAULT_TOOL)]
        tool: String,
    },

    /// Validate a match config without running
    #[command(after_help = "\
Examples:
  resmatch validate match.toml")]
    Validate {
        /// Path to the match config file
        config: PathBuf,
    },

    /// List the registered tools
    Tools,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, output, export, analysis, tool } => {
            cmd_run(config, json, output, export, analysis, &tool)
        }
        Commands::Validate { config } => cmd_validate(config),
        Commands::Tools => cmd_tools(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {message}");
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    fn runtime(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUNTIME, message: msg.into(), hint: None }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MatchError> for CliError {
    fn from(e: MatchError) -> Self {
        let code = match e {
            MatchError::ConfigParse(_) | MatchError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
            _ => EXIT_RUNTIME,
        };
        Self { code, message: e.to_string(), hint: None }
    }
}

/// Post-run exit decision. Mirrors `diff(1)`: a run that completed but
/// left records unaccounted for is a non-zero exit.
fn outcome_code(summary: &AnalysisSummary, fail_on_ambiguous: bool) -> Option<(u8, &'static str)> {
    if summary.ambiguous > 0 && fail_on_ambiguous {
        return Some((EXIT_MISMATCH, "ambiguous matches found (fail_on_ambiguous)"));
    }
    if summary.unmatched_orders > 0 || summary.unmatched_reservations > 0 {
        return Some((EXIT_MISMATCH, "unmatched records remain"));
    }
    if summary.ambiguous > 0 {
        return Some((EXIT_AMBIGUOUS, "ambiguous matches found"));
    }
    None
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    export_file: Option<PathBuf>,
    show_analysis: bool,
    tool_id: &str,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::runtime(format!("cannot read config: {e}")))?;
    let config = MatchConfig::from_toml(&config_str)?;

    let entry = registry::lookup(tool_id).ok_or_else(|| {
        let known: Vec<&str> = registry::TOOLS.iter().map(|t| t.id).collect();
        CliError::usage(format!("unknown tool id {tool_id:?}"))
            .with_hint(format!("registered tools: {}", known.join(", ")))
    })?;

    // Source paths resolve relative to the config file's directory.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let orders_path = base_dir.join(&config.sources.orders.file);
    let reservations_path = base_dir.join(&config.sources.reservations.file);

    let fail_on_ambiguous = config.matching.fail_on_ambiguous;
    let default_json = config.output.json.clone();
    let default_report = config.output.report.clone();

    let orders = read_table(&orders_path)?;
    let reservations = read_table(&reservations_path)?;

    let mut session = (entry.build)(config);
    session.load_files(orders, reservations);
    session.validate_files().map_err(CliError::runtime)?;

    let message = session.match_data()?;
    eprintln!("{message}");

    let report = session
        .report()
        .ok_or_else(|| CliError::runtime("match produced no report"))?;

    let json_str = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;

    // --output wins over the config's declared destination.
    let json_dest = output_file.or_else(|| default_json.as_deref().map(|p| base_dir.join(p)));
    if let Some(ref path) = json_dest {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    let export_dest = export_file.or_else(|| default_report.as_deref().map(|p| base_dir.join(p)));
    if let Some(ref path) = export_dest {
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            CliError::usage(format!("cannot infer export format from {}", path.display()))
                .with_hint("use an .xlsx, .csv or .json extension")
        })?;
        let bytes = export(report, format)?;
        std::fs::write(path, bytes)
            .map_err(|e| CliError::runtime(format!("cannot write {}: {e}", path.display())))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print!("{}", render::render_results(report));
        if show_analysis {
            println!();
            print!("{}", render::render_analysis(&report.summary));
        }
    }

    if let Some((code, message)) = outcome_code(&report.summary, fail_on_ambiguous) {
        return Err(CliError { code, message: message.into(), hint: None });
    }
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| CliError::runtime(format!("cannot read config: {e}")))?;
    let config = MatchConfig::from_toml(&config_str)?;

    println!("config OK: {}", config.name);
    println!("  orders:       {}", config.sources.orders.file);
    println!("  reservations: {}", config.sources.reservations.file);
    println!(
        "  min_score {} epsilon {} date_window_days {}",
        config.matching.min_score, config.matching.epsilon, config.matching.date_window_days
    );
    Ok(())
}

fn cmd_tools() -> Result<(), CliError> {
    for tool in registry::TOOLS {
        println!("{:<14} {:<32} {}", tool.id, tool.name, tool.description);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn summary(matched: usize, ambiguous: usize, uo: usize, ur: usize) -> AnalysisSummary {
        AnalysisSummary {
            total_orders: matched + ambiguous + uo,
            total_reservations: matched + ur,
            matched,
            ambiguous,
            unmatched_orders: uo,
            unmatched_reservations: ur,
            match_rate_pct: 0.0,
            order_amount_cents: 0,
            matched_amount_cents: 0,
            unmatched_amount_cents: 0,
            by_date: BTreeMap::new(),
            by_channel: BTreeMap::new(),
            bucket_counts: BTreeMap::new(),
        }
    }

    #[test]
    fn clean_run_exits_zero() {
        assert_eq!(outcome_code(&summary(3, 0, 0, 0), false), None);
    }

    #[test]
    fn leftovers_are_a_mismatch() {
        let (code, _) = outcome_code(&summary(1, 0, 1, 0), false).unwrap();
        assert_eq!(code, EXIT_MISMATCH);
        let (code, _) = outcome_code(&summary(1, 0, 0, 2), false).unwrap();
        assert_eq!(code, EXIT_MISMATCH);
    }

    #[test]
    fn ambiguity_alone_is_soft() {
        let (code, _) = outcome_code(&summary(1, 1, 0, 0), false).unwrap();
        assert_eq!(code, EXIT_AMBIGUOUS);
    }

    #[test]
    fn fail_on_ambiguous_hardens_the_exit() {
        let (code, msg) = outcome_code(&summary(1, 1, 0, 0), true).unwrap();
        assert_eq!(code, EXIT_MISMATCH);
        assert!(msg.contains("fail_on_ambiguous"));
    }

    #[test]
    fn config_errors_map_to_invalid_config() {
        let e: CliError = MatchError::ConfigParse("bad toml".into()).into();
        assert_eq!(e.code, EXIT_INVALID_CONFIG);
        let e: CliError = MatchError::Io("missing file".into()).into();
        assert_eq!(e.code, EXIT_RUNTIME);
    }
}
