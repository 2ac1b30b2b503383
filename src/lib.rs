pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod layout;
pub mod logging;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{ArchiveConfig, CliOverrides, Config, OutputConfig, ReportConfig};
pub use error::{ExportError, Result, Stage, UserFriendlyError};

// Core functionality re-exports
pub use exporter::{
    ArchiveWriter, ExportPlan, ExportReport, ExportRequest, FileOperations, ProjectTree,
};
pub use layout::{resolve_inputs, ResolvedFile, EXPORT_TABLE};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use exporter::{format_date, write_manifest};
use layout::report_target_name;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Runs the five export stages for a request under one configuration.
pub struct Exporter {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl Exporter {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    /// Silent exporter for library callers and tests.
    pub fn with_config(config: Config) -> Self {
        Self::new(config, OutputMode::Plain, 0, true)
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbosity_level(),
            cli_args.quiet,
        ))
    }

    /// CreateTree → ResolveInputs → Copy → Manifest → Archive.
    ///
    /// A failing stage aborts the run and leaves the project directory as it
    /// was at that point.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportReport> {
        let start_time = Instant::now();
        let date = format_date(request.date);

        tracing::info!(
            project = %request.project_name,
            source_dir = %request.source_dir.display(),
            report_file = %request.report_file.display(),
            date = %date,
            "starting export"
        );

        let tree = self.project_tree(request)?;
        let report_name = self.validate_request(request)?;

        self.output_formatter.start_operation("Creating project directory");
        tree.initialize(request.date)?;
        tracing::info!(path = %tree.project_dir().display(), "project tree created");

        self.output_formatter.start_operation("Resolving inputs");
        let files = resolve_inputs(
            &request.source_dir,
            &request.report_file,
            self.config.report.keep_original_name,
        )?;
        tracing::info!(count = files.len(), "inputs resolved");

        self.output_formatter.start_operation("Copying inputs");
        let copy_progress = self.progress_manager.create_copy_progress(files.len() as u64);
        let progress_callback = {
            let pb = copy_progress.clone();
            move |progress: &exporter::CopyProgress| {
                ui::progress::update_copy_progress(&pb, progress);
            }
        };
        let file_ops =
            FileOperations::new().with_preserve_mtime(self.config.archive.preserve_mtime);
        let copied = file_ops.copy_all(&files, tree.project_dir(), Some(&progress_callback));
        let (copied, progress) = match copied {
            Ok(result) => result,
            Err(e) => {
                copy_progress.abandon_with_message("Copy failed");
                return Err(e);
            }
        };
        ui::progress::finish_progress_with_summary(
            &copy_progress,
            &format!("Copied {} files", progress.files_copied),
            progress.elapsed(),
        );
        tracing::info!(files = progress.files_copied, bytes = progress.bytes_copied, "inputs copied");

        self.output_formatter.start_operation("Writing manifest");
        let manifest_path = write_manifest(
            tree.project_dir(),
            tree.project_name(),
            &report_name,
            request.date,
        )?;

        self.output_formatter.start_operation("Compressing archive");
        let archive_path = tree.archive_path(request.date);
        let spinner = self
            .progress_manager
            .create_spinner(&format!("Writing {}", archive_path.display()));
        let archive = ArchiveWriter::new()
            .with_compression_level(self.config.archive.compression_level)
            .write(tree.project_dir(), tree.project_name(), &archive_path);
        let archive = match archive {
            Ok(summary) => {
                spinner.finish_and_clear();
                summary
            }
            Err(e) => {
                spinner.abandon_with_message("Archive failed");
                return Err(e);
            }
        };
        tracing::info!(
            path = %archive.path.display(),
            bytes = archive.bytes,
            entries = archive.entries,
            "archive created"
        );

        let report = ExportReport::new(
            tree.project_name(),
            tree.project_dir().to_path_buf(),
            manifest_path,
            date,
            &copied,
            &progress,
            &archive,
            start_time.elapsed(),
        );

        self.output_formatter
            .success(&format!("Export written to {}", report.archive_path.display()));

        Ok(report)
    }

    /// Everything `export` would do, without creating or copying anything.
    pub fn plan(&self, request: &ExportRequest) -> Result<ExportPlan> {
        let tree = self.project_tree(request)?;
        self.validate_request(request)?;
        let archive_path = tree.archive_path(request.date);
        let files = resolve_inputs(
            &request.source_dir,
            &request.report_file,
            self.config.report.keep_original_name,
        )?;

        Ok(ExportPlan {
            project_name: tree.project_name().to_string(),
            project_dir: tree.project_dir().to_path_buf(),
            archive_exists: archive_path.exists(),
            archive_path,
            date: format_date(request.date),
            files,
            project_exists: tree.project_dir().exists(),
            force_overwrite: tree.force_overwrite(),
        })
    }

    /// Request checks that must pass before anything is written: the run
    /// directory exists and the delivered report name is usable. Returns that
    /// report name.
    fn validate_request(&self, request: &ExportRequest) -> Result<String> {
        if !request.source_dir.is_dir() {
            return Err(ExportError::MissingInput {
                path: request.source_dir.clone(),
            });
        }

        report_target_name(
            &request.report_file,
            self.config.report.keep_original_name,
        )
    }

    fn project_tree(&self, request: &ExportRequest) -> Result<ProjectTree> {
        Ok(ProjectTree::new(
            self.config.output.base_directory.clone(),
            request.project_name.clone(),
        )?
        .with_force_overwrite(self.config.output.force_overwrite))
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn handle_error(&self, error: &ExportError) {
        self.progress_manager.clear();
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Export with default configuration into `base_dir`, without terminal output.
pub fn export(
    source_dir: &Path,
    report_file: &Path,
    project_name: &str,
    base_dir: Option<PathBuf>,
) -> Result<ExportReport> {
    let mut config = Config::default();
    if let Some(base) = base_dir {
        config.output.base_directory = base;
    }

    let request = ExportRequest::new(
        source_dir.to_path_buf(),
        report_file.to_path_buf(),
        project_name,
    );
    Exporter::with_config(config).export(&request)
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
