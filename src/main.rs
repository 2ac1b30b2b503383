use clap::Parser;
use dada2_export::logging::{init_logging, LogLevel};
use dada2_export::{Cli, ExportError, Exporter, OutputFormatter, OutputMode, UserFriendlyError};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogLevel::from_verbosity(cli.verbose, cli.quiet)) {
        eprintln!("{}", e);
    }

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let exporter = match Exporter::from_cli(&cli) {
        Ok(exporter) => exporter,
        Err(e) => {
            print_startup_error(&e);
            return e.exit_code();
        }
    };

    let request = match cli.to_request() {
        Ok(request) => request,
        Err(e) => {
            exporter.handle_error(&e);
            return e.exit_code();
        }
    };

    if cli.dry_run {
        return handle_dry_run(&exporter, &request);
    }

    match exporter.export(&request) {
        Ok(report) => {
            exporter.output_formatter().print_export_report(&report);
            0
        }
        Err(e) => {
            tracing::error!(stage = %e.stage(), error = %e, "export failed");
            exporter.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "dada2-export.toml".to_string());

    match Exporter::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!(
                "  dada2-export --source-dir <run> --report-file <report.html> --project-name <name> --config {}",
                config_path
            );
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(exporter: &Exporter, request: &dada2_export::ExportRequest) -> i32 {
    let formatter = exporter.output_formatter();

    formatter.info("DRY RUN MODE - nothing will be written");

    match exporter.plan(request) {
        Ok(plan) => {
            formatter.print_export_plan(&plan);
            if let Some(e) = plan.blocking_error() {
                exporter.handle_error(&e);
                return e.exit_code();
            }
            formatter.success("Dry run completed successfully");
            0
        }
        Err(e) => {
            exporter.handle_error(&e);
            e.exit_code()
        }
    }
}

fn print_startup_error(error: &ExportError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
