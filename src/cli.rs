//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::error::PipelineError;
use crate::models::{DateRange, LegalizationKind, OperatorSelection, ReportView};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// prodreport - operator productivity reports from shared spreadsheets
///
/// Loads the PPL, Convenios, RIPS and Facturacion sheets (from the local
/// snapshot cache, or freshly with --sync), applies the date, category and
/// operator filters, and writes a Markdown or JSON report.
///
/// Examples:
///   prodreport --sync --spreadsheet-id 1AbC...
///   prodreport --from 2024-01-01 --to 2024-01-31
///   prodreport --view rips --operator Ana,Beto --format json
///   prodreport --list-operators
///   prodreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Fetch every source before reporting
    ///
    /// Successful fetches replace the cached snapshot; failed ones fall back
    /// to it.
    #[arg(long)]
    pub sync: bool,

    /// Restrict the report to one view (default: all three)
    #[arg(long, value_name = "VIEW")]
    pub view: Option<ViewArg>,

    /// Legalization types to include (comma-separated)
    ///
    /// Example: --category ppl,convenios
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    pub category: Option<Vec<CategoryArg>>,

    /// Operators to include (comma-separated); "all" selects everybody
    ///
    /// Example: --operator "Ana,Beto"
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub operator: Vec<String>,

    /// First day of the date window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Last day of the date window (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Length of the default date window in days
    #[arg(long, value_name = "DAYS")]
    pub lookback_days: Option<u32>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Default: from config or productivity_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .prodreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Spreadsheet document id
    #[arg(long, value_name = "ID", env = "PRODREPORT_SPREADSHEET_ID")]
    pub spreadsheet_id: Option<String>,

    /// Request timeout in seconds for each sheet fetch
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory holding the snapshot cache
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Neither read nor write the snapshot cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print every operator found in the loaded data and exit
    #[arg(long)]
    pub list_operators: bool,

    /// Generate a default .prodreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// View selectable with --view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewArg {
    Legalizaciones,
    Rips,
    Facturacion,
}

impl ViewArg {
    pub fn view(self) -> ReportView {
        match self {
            ViewArg::Legalizaciones => ReportView::Legalizaciones,
            ViewArg::Rips => ReportView::Rips,
            ViewArg::Facturacion => ReportView::Facturacion,
        }
    }
}

/// Legalization type selectable with --category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CategoryArg {
    Ppl,
    Convenios,
}

impl CategoryArg {
    pub fn kind(self) -> LegalizationKind {
        match self {
            CategoryArg::Ppl => LegalizationKind::Ppl,
            CategoryArg::Convenios => LegalizationKind::Convenios,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Views to compute, in display order.
    pub fn views(&self) -> Vec<ReportView> {
        match self.view {
            Some(view) => vec![view.view()],
            None => ReportView::ALL.to_vec(),
        }
    }

    /// Operator selection from --operator.
    pub fn operator_selection(&self) -> OperatorSelection {
        OperatorSelection::from_names(&self.operator)
    }

    /// Date window from --from/--to, falling back to `lookback_days` ending
    /// on `today`.
    pub fn date_range(
        &self,
        today: NaiveDate,
        lookback_days: u32,
    ) -> Result<DateRange, PipelineError> {
        let end = self.to.unwrap_or(today);
        match self.from {
            Some(start) => DateRange::new(start, end),
            None => DateRange::lookback(end, lookback_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            sync: false,
            view: None,
            category: None,
            operator: Vec::new(),
            from: None,
            to: None,
            lookback_days: None,
            format: OutputFormat::Markdown,
            output: None,
            config: None,
            spreadsheet_id: None,
            timeout: None,
            cache_dir: None,
            no_cache: false,
            list_operators: false,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        args.timeout = Some(5);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_views() {
        let mut args = make_args();
        assert_eq!(args.views(), ReportView::ALL.to_vec());

        args.view = Some(ViewArg::Rips);
        assert_eq!(args.views(), vec![ReportView::Rips]);
    }

    #[test]
    fn test_date_range_defaults_to_lookback() {
        let args = make_args();
        let range = args.date_range(date(2024, 3, 31), 30).unwrap();
        assert_eq!(range.start(), date(2024, 3, 1));
        assert_eq!(range.end(), date(2024, 3, 31));
    }

    #[test]
    fn test_date_range_huge_lookback() {
        let args = make_args();
        assert!(matches!(
            args.date_range(date(2024, 3, 31), u32::MAX),
            Err(PipelineError::LookbackOutOfRange { .. })
        ));
    }

    #[test]
    fn test_date_range_explicit() {
        let mut args = make_args();
        args.from = Some(date(2024, 1, 1));
        args.to = Some(date(2024, 1, 31));
        let range = args.date_range(date(2024, 6, 1), 30).unwrap();
        assert_eq!(range.start(), date(2024, 1, 1));
        assert_eq!(range.end(), date(2024, 1, 31));
    }

    #[test]
    fn test_date_range_inverted() {
        let mut args = make_args();
        args.from = Some(date(2024, 2, 1));
        args.to = Some(date(2024, 1, 1));
        assert!(matches!(
            args.date_range(date(2024, 6, 1), 30),
            Err(PipelineError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_operator_selection() {
        let mut args = make_args();
        assert_eq!(args.operator_selection(), OperatorSelection::All);

        args.operator = vec!["Ana".to_string(), " Beto ".to_string()];
        assert!(args.operator_selection().allows("Beto"));
        assert!(!args.operator_selection().allows("Carla"));

        args.operator.push("Todos".to_string());
        assert_eq!(args.operator_selection(), OperatorSelection::All);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "prodreport",
            "--view",
            "facturacion",
            "--category",
            "ppl",
            "--operator",
            "Ana,Beto",
            "--from",
            "2024-01-01",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.view, Some(ViewArg::Facturacion));
        assert_eq!(args.category, Some(vec![CategoryArg::Ppl]));
        assert_eq!(args.operator, vec!["Ana", "Beto"]);
        assert_eq!(args.from, Some(date(2024, 1, 1)));
        assert_eq!(args.format, OutputFormat::Json);
    }
}
