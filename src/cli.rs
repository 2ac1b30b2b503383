use crate::config::{CliOverrides, Config};
use crate::error::{ExportError, Result};
use crate::exporter::{parse_date, ExportRequest};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dada2-export")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Package dada2 analysis outputs into a customer deliverable")]
#[command(
    long_about = "Collects the abundance tables, taxonomy table and reports of a dada2 run, \
                  renames them to their delivered names, writes a Files.txt manifest and \
                  compresses the project directory into <project>_<DD-MM-YYYY>.tar.gz."
)]
#[command(after_help = "EXAMPLES:\n  \
    dada2-export --source-dir=runs/dada2 --report-file=report.html --project-name=demo\n  \
    dada2-export --dada2-dir=runs/dada2 --report-file=report.html --project-name=demo --force\n  \
    dada2-export --source-dir=runs/dada2 --report-file=report.html --project-name=demo --dry-run")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// dada2 run directory
    #[arg(
        long,
        visible_alias = "dada2-dir",
        required_unless_present = "generate_config"
    )]
    pub source_dir: Option<PathBuf>,

    /// Analysis report (HTML) to deliver alongside the dada2 report
    #[arg(long, required_unless_present = "generate_config")]
    pub report_file: Option<PathBuf>,

    /// Name of the project directory and archive prefix
    #[arg(long, required_unless_present = "generate_config")]
    pub project_name: Option<String>,

    /// Directory receiving the project directory and archive (defaults to the current directory)
    #[arg(long, env = "DADA2_EXPORT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Export date written to the manifest and archive name (DD-MM-YYYY, defaults to today)
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Keep the report file's own name instead of analysis_report.html
    #[arg(long)]
    pub keep_report_name: bool,

    /// gzip compression level (0-9)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub compression_level: Option<u32>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Replace an existing project directory and archive
    #[arg(long, help = "Overwrite an existing project directory")]
    pub force: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Resolve inputs and show the export plan without writing anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_output_dir(self.output_dir.clone())
            .with_force(self.force)
            .with_keep_report_name(self.keep_report_name.then_some(true))
            .with_compression_level(self.compression_level)
    }

    pub fn to_request(&self) -> Result<ExportRequest> {
        let missing = |flag: &str| ExportError::Config {
            message: format!("{} is required", flag),
        };

        let source_dir = self.source_dir.clone().ok_or_else(|| missing("--source-dir"))?;
        let report_file = self
            .report_file
            .clone()
            .ok_or_else(|| missing("--report-file"))?;
        let project_name = self
            .project_name
            .clone()
            .ok_or_else(|| missing("--project-name"))?;

        let request = ExportRequest::new(source_dir, report_file, project_name);
        Ok(match self.date {
            Some(date) => request.with_date(date),
            None => request,
        })
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

pub fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}
