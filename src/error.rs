use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    CreateTree,
    ResolveInputs,
    Copy,
    Manifest,
    Archive,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::CreateTree => "create tree",
            Stage::ResolveInputs => "resolve inputs",
            Stage::Copy => "copy",
            Stage::Manifest => "manifest",
            Stage::Archive => "archive",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Invalid date '{value}' (expected DD-MM-YYYY)")]
    InvalidDate { value: String },

    #[error("Failed to create directory {}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Project directory already exists: {}", path.display())]
    ProjectExists { path: PathBuf },

    #[error("Archive already exists: {}", path.display())]
    ArchiveExists { path: PathBuf },

    #[error("Required input file is missing: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Failed to copy {} to {}", source_path.display(), destination.display())]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest {}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create archive {}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn stage(&self) -> Stage {
        match self {
            ExportError::Config { .. }
            | ExportError::InvalidProjectName { .. }
            | ExportError::InvalidDate { .. }
            | ExportError::Io(_) => Stage::Setup,
            ExportError::DirectoryCreation { .. }
            | ExportError::ProjectExists { .. }
            | ExportError::ArchiveExists { .. } => Stage::CreateTree,
            ExportError::MissingInput { .. } => Stage::ResolveInputs,
            ExportError::Copy { .. } => Stage::Copy,
            ExportError::Manifest { .. } => Stage::Manifest,
            ExportError::Archive { .. } => Stage::Archive,
        }
    }

    /// Process exit code reported by the binary for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExportError::Config { .. }
            | ExportError::InvalidProjectName { .. }
            | ExportError::InvalidDate { .. } => 2,
            ExportError::DirectoryCreation { .. }
            | ExportError::ProjectExists { .. }
            | ExportError::ArchiveExists { .. } => 3,
            ExportError::MissingInput { .. } => 4,
            ExportError::Copy { .. } => 5,
            ExportError::Manifest { .. } => 6,
            ExportError::Archive { .. } => 7,
            ExportError::Io(_) => 1,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ExportError {
    fn user_message(&self) -> String {
        match self {
            ExportError::Copy {
                source_path,
                destination,
                source,
            } => format!(
                "[{}] Failed to copy {} to {}: {}",
                self.stage(),
                source_path.display(),
                destination.display(),
                source
            ),
            ExportError::DirectoryCreation { source, .. }
            | ExportError::Manifest { source, .. }
            | ExportError::Archive { source, .. } => {
                format!("[{}] {}: {}", self.stage(), self, source)
            }
            _ => format!("[{}] {}", self.stage(), self),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ExportError::ProjectExists { .. } => Some(
                "Remove the existing directory, choose a different --project-name, or use --force to overwrite.".to_string()
            ),
            ExportError::ArchiveExists { .. } => Some(
                "Move the delivered archive aside, choose a different --project-name or --date, or use --force to replace it.".to_string()
            ),
            ExportError::MissingInput { .. } => Some(
                "Check that --source-dir points at a completed dada2 run and that --report-file exists.".to_string()
            ),
            ExportError::InvalidProjectName { .. } => Some(
                "Use only letters, digits, hyphens, underscores and dots in --project-name.".to_string()
            ),
            ExportError::InvalidDate { .. } => Some(
                "Pass the date as day-month-year, e.g. --date 01-01-2024.".to_string()
            ),
            ExportError::DirectoryCreation { .. } => Some(
                "Ensure you have write permission for the output directory.".to_string()
            ),
            ExportError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = ExportError::MissingInput {
            path: PathBuf::from("run/abundance.dir/taxa_abundances.tsv"),
        };
        let message = error.user_message();
        assert!(message.contains("resolve inputs"));
        assert!(message.contains("taxa_abundances.tsv"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_copy_error_names_both_paths() {
        let error = ExportError::Copy {
            source_path: PathBuf::from("in/report.html"),
            destination: PathBuf::from("demo/Reports/dada2_report.html"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let message = error.user_message();
        assert!(message.contains("in/report.html"));
        assert!(message.contains("dada2_report.html"));
        assert!(message.contains("disk full"));
        assert_eq!(error.stage(), Stage::Copy);
    }

    #[test]
    fn test_exit_codes_distinguish_stages() {
        let exists = ExportError::ProjectExists {
            path: PathBuf::from("demo"),
        };
        let missing = ExportError::MissingInput {
            path: PathBuf::from("x"),
        };
        let archive = ExportError::Archive {
            path: PathBuf::from("demo_01-01-2024.tar.gz"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        };

        assert_eq!(exists.exit_code(), 3);
        assert_eq!(missing.exit_code(), 4);
        assert_eq!(archive.exit_code(), 7);
        assert_eq!(exists.stage(), Stage::CreateTree);
    }

    #[test]
    fn test_archive_exists_belongs_to_create_tree() {
        let error = ExportError::ArchiveExists {
            path: PathBuf::from("demo_01-01-2024.tar.gz"),
        };
        assert_eq!(error.stage(), Stage::CreateTree);
        assert_eq!(error.exit_code(), 3);
        assert!(error.user_message().contains("demo_01-01-2024.tar.gz"));
        assert!(error.suggestion().unwrap().contains("--force"));
    }
}
