pub mod archive;
pub mod file_ops;
pub mod manifest;
pub mod project_tree;
pub mod report;

pub use archive::{ArchiveSummary, ArchiveWriter};
pub use file_ops::{CopiedFile, CopyProgress, FileOperations};
pub use manifest::{render_manifest, write_manifest};
pub use project_tree::{archive_file_name, format_date, parse_date, ProjectTree};
pub use report::{ExportPlan, ExportReport, ExportedFileInfo};

use chrono::NaiveDate;
use std::path::PathBuf;

/// Caller-supplied arguments for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub source_dir: PathBuf,
    pub report_file: PathBuf,
    pub project_name: String,
    pub date: NaiveDate,
}

impl ExportRequest {
    /// Build a request dated today in local time.
    pub fn new<S: Into<String>>(source_dir: PathBuf, report_file: PathBuf, project_name: S) -> Self {
        Self {
            source_dir,
            report_file,
            project_name: project_name.into(),
            date: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}
