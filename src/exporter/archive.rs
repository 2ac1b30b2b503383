use crate::error::{ExportError, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

/// Writes a project tree into a `.tar.gz`, publishing it only once complete.
pub struct ArchiveWriter {
    compression_level: u32,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            compression_level: 6,
        }
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Archive `project_dir` with every entry rooted at `root_name/`.
    ///
    /// The tarball is built in a temporary file next to `archive_path` and
    /// renamed into place on success. An existing archive of the same name is
    /// replaced.
    pub fn write(
        &self,
        project_dir: &Path,
        root_name: &str,
        archive_path: &Path,
    ) -> Result<ArchiveSummary> {
        let archive_error = |source: io::Error| ExportError::Archive {
            path: archive_path.to_path_buf(),
            source,
        };

        let parent = match archive_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", root_name))
            .suffix(".partial")
            .tempfile_in(&parent)
            .map_err(archive_error)?;

        let entries = self
            .write_tarball(temp.as_file(), project_dir, root_name)
            .map_err(archive_error)?;

        let found = count_entries(temp.path()).map_err(archive_error)?;
        if found != entries {
            return Err(archive_error(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("archive holds {} entries, expected {}", found, entries),
            )));
        }

        temp.persist(archive_path)
            .map_err(|e| archive_error(e.error))?;

        let bytes = std::fs::metadata(archive_path)
            .map_err(archive_error)?
            .len();

        tracing::debug!(
            path = %archive_path.display(),
            entries,
            bytes,
            "archive written"
        );

        Ok(ArchiveSummary {
            path: archive_path.to_path_buf(),
            entries,
            bytes,
        })
    }

    fn write_tarball(&self, file: &File, project_dir: &Path, root_name: &str) -> io::Result<usize> {
        let encoder = GzEncoder::new(file, Compression::new(self.compression_level));
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        let mut entries = 0usize;
        for entry in WalkDir::new(project_dir).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(project_dir)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            let name = Path::new(root_name).join(relative);

            if entry.file_type().is_dir() {
                builder.append_dir(&name, entry.path())?;
            } else {
                builder.append_path_with_name(entry.path(), &name)?;
            }
            entries += 1;
        }

        let encoder = builder.into_inner()?;
        let file = encoder.finish()?;
        file.sync_all()?;

        Ok(entries)
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of entries in a `.tar.gz`, reading it end to end.
pub fn count_entries(path: &Path) -> io::Result<usize> {
    let file = File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut count = 0usize;
    for entry in archive.entries()? {
        let mut entry = entry?;
        io::copy(&mut entry, &mut io::sink())?;
        count += 1;
    }
    Ok(count)
}
