use crate::error::{ExportError, Result};
use crate::layout::{DATA_DIR, REPORTS_DIR};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// Day-month-year stamp used in the manifest and archive name.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Owns the `<project>/Reports` and `<project>/Data` tree for one export.
#[derive(Debug, Clone)]
pub struct ProjectTree {
    base_path: PathBuf,
    project_name: String,
    project_dir: PathBuf,
    force_overwrite: bool,
}

impl ProjectTree {
    pub fn new<S: Into<String>>(base_path: PathBuf, project_name: S) -> Result<Self> {
        let project_name = project_name.into();
        validate_project_name(&project_name)?;
        let project_dir = base_path.join(&project_name);

        Ok(Self {
            base_path,
            project_name,
            project_dir,
            force_overwrite: false,
        })
    }

    pub fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Create the project tree, applying the overwrite policy to a leftover
    /// tree and to an archive already delivered for `date`.
    pub fn initialize(&self, date: NaiveDate) -> Result<()> {
        self.ensure_base_directory()?;

        if !self.force_overwrite {
            if self.project_dir.exists() {
                return Err(ExportError::ProjectExists {
                    path: self.project_dir.clone(),
                });
            }

            let archive_path = self.archive_path(date);
            if archive_path.exists() {
                return Err(ExportError::ArchiveExists { path: archive_path });
            }
        }

        if self.project_dir.exists() {
            tracing::info!(path = %self.project_dir.display(), "removing existing project directory");
            let removed = if self.project_dir.is_dir() {
                fs::remove_dir_all(&self.project_dir)
            } else {
                fs::remove_file(&self.project_dir)
            };
            removed.map_err(|source| ExportError::DirectoryCreation {
                path: self.project_dir.clone(),
                source,
            })?;
        }

        for dir in [
            self.project_dir.clone(),
            self.reports_dir(),
            self.data_dir(),
        ] {
            fs::create_dir(&dir).map_err(|source| ExportError::DirectoryCreation {
                path: dir.clone(),
                source,
            })?;
            tracing::debug!(path = %dir.display(), "created directory");
        }

        Ok(())
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.project_dir.join(REPORTS_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.project_dir.join(DATA_DIR)
    }

    pub fn force_overwrite(&self) -> bool {
        self.force_overwrite
    }

    /// `<base>/<project>_<DD-MM-YYYY>.tar.gz`
    pub fn archive_path(&self, date: NaiveDate) -> PathBuf {
        self.base_path.join(archive_file_name(&self.project_name, date))
    }

    fn ensure_base_directory(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).map_err(|source| {
                ExportError::DirectoryCreation {
                    path: self.base_path.clone(),
                    source,
                }
            })?;
        }

        let metadata = fs::metadata(&self.base_path).map_err(|source| {
            ExportError::DirectoryCreation {
                path: self.base_path.clone(),
                source,
            }
        })?;
        if !metadata.is_dir() {
            return Err(ExportError::DirectoryCreation {
                path: self.base_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "output path exists and is not a directory",
                ),
            });
        }
        if metadata.permissions().readonly() {
            return Err(ExportError::DirectoryCreation {
                path: self.base_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "output directory is read-only",
                ),
            });
        }

        Ok(())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| ExportError::InvalidDate {
        value: value.to_string(),
    })
}

pub fn archive_file_name(project_name: &str, date: NaiveDate) -> String {
    format!("{}_{}.tar.gz", project_name, format_date(date))
}

/// Project names become a directory name and an archive prefix, so they must
/// be a single plain path component.
pub fn validate_project_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| ExportError::InvalidProjectName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }

    if name == "." || name == ".." {
        return Err(invalid("name must not be a relative directory reference"));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name must not contain path separators"));
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid_chars {
        return Err(invalid(
            "only alphanumeric characters, hyphens, underscores and dots are allowed",
        ));
    }

    if name.len() > 200 {
        return Err(invalid("name must be 200 characters or less"));
    }

    Ok(())
}
