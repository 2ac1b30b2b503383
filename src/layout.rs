//! Fixed mapping from a dada2 run directory to the delivered project layout.
//!
//! Every export copies the same set of files. The table below is the single
//! place that names them; resolution, copying, dry runs and tests all walk it.

use crate::error::{ExportError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const REPORTS_DIR: &str = "Reports";
pub const DATA_DIR: &str = "Data";
pub const MANIFEST_FILE: &str = "Files.txt";

/// Target name of the analysis report unless its original name is kept.
pub const ANALYSIS_REPORT_NAME: &str = "analysis_report.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    Reports,
    Data,
}

impl Section {
    pub fn dir_name(self) -> &'static str {
        match self {
            Section::Reports => REPORTS_DIR,
            Section::Data => DATA_DIR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRef {
    /// Path relative to the dada2 run directory.
    RunRelative(&'static str),
    /// The analysis report passed on the command line.
    ReportFile,
}

#[derive(Debug, Clone, Copy)]
pub struct MappingEntry {
    pub source: SourceRef,
    pub section: Section,
    pub target_name: &'static str,
}

pub const EXPORT_TABLE: &[MappingEntry] = &[
    MappingEntry {
        source: SourceRef::RunRelative("abundance.dir/taxa_abundances.tsv"),
        section: Section::Data,
        target_name: "merged_table.tsv",
    },
    MappingEntry {
        source: SourceRef::RunRelative("abundance.dir/merged_abundance_id.tsv"),
        section: Section::Data,
        target_name: "abundance_table.tsv",
    },
    MappingEntry {
        source: SourceRef::RunRelative("taxonomy.dir/merged_taxonomy.tsv"),
        section: Section::Data,
        target_name: "taxonomy_table.tsv",
    },
    MappingEntry {
        source: SourceRef::RunRelative("report.dir/report.html"),
        section: Section::Reports,
        target_name: "dada2_report.html",
    },
    MappingEntry {
        source: SourceRef::ReportFile,
        section: Section::Reports,
        target_name: ANALYSIS_REPORT_NAME,
    },
];

/// An input that exists on disk paired with where it lands in the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub source: PathBuf,
    pub section: Section,
    /// Destination relative to the project directory.
    pub destination: PathBuf,
}

impl ResolvedFile {
    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Name the analysis report will carry inside `Reports/`.
pub fn report_target_name(report_file: &Path, keep_original_name: bool) -> Result<String> {
    if !keep_original_name {
        return Ok(ANALYSIS_REPORT_NAME.to_string());
    }

    let name = report_file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ExportError::MissingInput {
            path: report_file.to_path_buf(),
        })?;

    let collides = EXPORT_TABLE.iter().any(|entry| {
        entry.section == Section::Reports
            && entry.source != SourceRef::ReportFile
            && entry.target_name == name
    });
    if collides {
        return Err(ExportError::Config {
            message: format!(
                "Report file name '{}' collides with a generated report; disable report.keep_original_name",
                name
            ),
        });
    }

    Ok(name)
}

/// Resolve every table entry against the run directory and report file.
///
/// Fails on the first missing input in table order.
pub fn resolve_inputs(
    source_dir: &Path,
    report_file: &Path,
    keep_original_name: bool,
) -> Result<Vec<ResolvedFile>> {
    if !source_dir.is_dir() {
        return Err(ExportError::MissingInput {
            path: source_dir.to_path_buf(),
        });
    }

    let report_name = report_target_name(report_file, keep_original_name)?;
    let mut resolved = Vec::with_capacity(EXPORT_TABLE.len());

    for entry in EXPORT_TABLE {
        let (source, target_name) = match entry.source {
            SourceRef::RunRelative(relative) => (source_dir.join(relative), entry.target_name),
            SourceRef::ReportFile => (report_file.to_path_buf(), report_name.as_str()),
        };

        if !source.is_file() {
            tracing::debug!(path = %source.display(), "required input not found");
            return Err(ExportError::MissingInput { path: source });
        }

        resolved.push(ResolvedFile {
            source,
            section: entry.section,
            destination: Path::new(entry.section.dir_name()).join(target_name),
        });
    }

    Ok(resolved)
}
