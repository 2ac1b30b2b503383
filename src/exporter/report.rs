use crate::error::ExportError;
use crate::exporter::archive::ArchiveSummary;
use crate::exporter::file_ops::{CopiedFile, CopyProgress};
use crate::layout::ResolvedFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedFileInfo {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bytes: u64,
}

impl From<&CopiedFile> for ExportedFileInfo {
    fn from(file: &CopiedFile) -> Self {
        Self {
            source: file.source.clone(),
            destination: file.destination.clone(),
            bytes: file.bytes,
        }
    }
}

/// Outcome of a completed export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub archive_path: PathBuf,
    /// DD-MM-YYYY, as written to the manifest and archive name.
    pub date: String,
    pub files: Vec<ExportedFileInfo>,
    pub total_bytes: u64,
    pub archive_bytes: u64,
    pub archive_entries: usize,
    pub duration: Duration,
    pub exported_at: DateTime<Utc>,
}

impl ExportReport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        project_name: &str,
        project_dir: PathBuf,
        manifest_path: PathBuf,
        date: String,
        copied: &[CopiedFile],
        progress: &CopyProgress,
        archive: &ArchiveSummary,
        duration: Duration,
    ) -> Self {
        Self {
            project_name: project_name.to_string(),
            project_dir,
            manifest_path,
            archive_path: archive.path.clone(),
            date,
            files: copied.iter().map(ExportedFileInfo::from).collect(),
            total_bytes: progress.bytes_copied,
            archive_bytes: archive.bytes,
            archive_entries: archive.entries,
            duration,
            exported_at: Utc::now(),
        }
    }
}

/// What an export would do, computed without writing anything.
#[derive(Debug, Clone, Serialize)]
pub struct ExportPlan {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub archive_path: PathBuf,
    pub date: String,
    pub files: Vec<ResolvedFile>,
    pub project_exists: bool,
    pub archive_exists: bool,
    pub force_overwrite: bool,
}

impl ExportPlan {
    /// The error the export would stop with at tree creation, if any.
    pub fn blocking_error(&self) -> Option<ExportError> {
        if self.force_overwrite {
            return None;
        }
        if self.project_exists {
            return Some(ExportError::ProjectExists {
                path: self.project_dir.clone(),
            });
        }
        if self.archive_exists {
            return Some(ExportError::ArchiveExists {
                path: self.archive_path.clone(),
            });
        }
        None
    }
}
