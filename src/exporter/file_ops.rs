use crate::error::{ExportError, Result};
use crate::layout::ResolvedFile;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CopyProgress {
    pub files_copied: usize,
    pub total_files: usize,
    pub bytes_copied: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl CopyProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_copied: 0,
            total_files,
            bytes_copied: 0,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn update_file(&mut self, filename: String, bytes: u64) {
        self.files_copied += 1;
        self.bytes_copied += bytes;
        self.current_file = Some(filename);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// One input copied into the project tree.
#[derive(Debug, Clone)]
pub struct CopiedFile {
    pub source: PathBuf,
    /// Relative to the project directory.
    pub destination: PathBuf,
    pub bytes: u64,
}

pub struct FileOperations {
    preserve_mtime: bool,
    buffer_size: usize,
}

impl FileOperations {
    pub fn new() -> Self {
        Self {
            preserve_mtime: true,
            buffer_size: 64 * 1024,
        }
    }

    pub fn with_preserve_mtime(mut self, preserve: bool) -> Self {
        self.preserve_mtime = preserve;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(4096);
        self
    }

    /// Copy every resolved input below `project_dir`, stopping at the first failure.
    pub fn copy_all(
        &self,
        files: &[ResolvedFile],
        project_dir: &Path,
        progress_callback: Option<&dyn Fn(&CopyProgress)>,
    ) -> Result<(Vec<CopiedFile>, CopyProgress)> {
        let mut progress = CopyProgress::new(files.len());
        let mut copied = Vec::with_capacity(files.len());

        for file in files {
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let dest = project_dir.join(&file.destination);
            let bytes = self.copy_file(&file.source, &dest)?;
            tracing::debug!(
                source = %file.source.display(),
                destination = %dest.display(),
                bytes,
                "copied input"
            );

            progress.update_file(file.file_name(), bytes);
            copied.push(CopiedFile {
                source: file.source.clone(),
                destination: file.destination.clone(),
                bytes,
            });
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        Ok((copied, progress))
    }

    /// Copy one file; a partially written destination is removed on failure.
    pub fn copy_file(&self, source: &Path, dest: &Path) -> Result<u64> {
        let copy_error = |source_err: io::Error| ExportError::Copy {
            source_path: source.to_path_buf(),
            destination: dest.to_path_buf(),
            source: source_err,
        };

        if !source.is_file() {
            return Err(copy_error(io::Error::new(
                io::ErrorKind::NotFound,
                "source file disappeared before it could be copied",
            )));
        }

        match self.copy_file_with_buffer(source, dest) {
            Ok(bytes) => {
                if self.preserve_mtime {
                    preserve_modified_time(source, dest);
                }
                Ok(bytes)
            }
            Err(e) => {
                let _ = fs::remove_file(dest);
                Err(copy_error(e))
            }
        }
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> io::Result<u64> {
        let source_file = fs::File::open(source)?;
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;

        Ok(total_bytes)
    }
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn preserve_modified_time(source: &Path, dest: &Path) {
    if let Ok(source_metadata) = fs::metadata(source) {
        if let Ok(modified_time) = source_metadata.modified() {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified_time));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Section;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn resolved(source: PathBuf, destination: &str) -> ResolvedFile {
        ResolvedFile {
            source,
            section: Section::Data,
            destination: PathBuf::from(destination),
        }
    }

    #[test]
    fn test_copy_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("taxa_abundances.tsv");
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&source, &content).unwrap();

        let dest = temp_dir.path().join("merged_table.tsv");
        let ops = FileOperations::new();
        let bytes = ops.copy_file(&source, &dest).unwrap();

        assert_eq!(bytes, content.len() as u64);
        assert_eq!(fs::read(&dest).unwrap(), content);
    }

    #[test]
    fn test_copy_preserves_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.tsv");
        fs::write(&source, "a\tb\n").unwrap();
        let past = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&source, past).unwrap();

        let dest = temp_dir.path().join("out.tsv");
        FileOperations::new().copy_file(&source, &dest).unwrap();

        let dest_mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(dest_mtime.unix_seconds(), 1_600_000_000);
    }

    #[test]
    fn test_copy_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("in.tsv");
        fs::write(&source, "x").unwrap();
        let dest = temp_dir.path().join("no-such-dir/out.tsv");

        let err = FileOperations::new().copy_file(&source, &dest).unwrap_err();
        match err {
            ExportError::Copy {
                source_path,
                destination,
                ..
            } => {
                assert_eq!(source_path, source);
                assert_eq!(destination, dest);
            }
            other => panic!("expected Copy error, got {:?}", other),
        }
    }

    #[test]
    fn test_vanished_source_is_a_copy_failure() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("gone.tsv");
        let dest = temp_dir.path().join("out.tsv");

        let err = FileOperations::new().copy_file(&source, &dest).unwrap_err();
        assert_eq!(err.stage(), crate::error::Stage::Copy);
        match err {
            ExportError::Copy { source: io_err, .. } => {
                assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Copy error, got {:?}", other),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_copy_all_reports_progress() {
        let temp_dir = TempDir::new().unwrap();
        let project = temp_dir.path().join("demo");
        fs::create_dir_all(project.join("Data")).unwrap();

        let a = temp_dir.path().join("a.tsv");
        let b = temp_dir.path().join("b.tsv");
        fs::write(&a, "12345").unwrap();
        fs::write(&b, "123").unwrap();

        let files = vec![
            resolved(a, "Data/first.tsv"),
            resolved(b, "Data/second.tsv"),
        ];

        let calls = Cell::new(0);
        let callback = |_: &CopyProgress| calls.set(calls.get() + 1);
        let (copied, progress) = FileOperations::new()
            .copy_all(&files, &project, Some(&callback))
            .unwrap();

        assert_eq!(copied.len(), 2);
        assert_eq!(progress.files_copied, 2);
        assert_eq!(progress.bytes_copied, 8);
        assert_eq!(calls.get(), 3);
        assert_eq!(fs::read_to_string(project.join("Data/second.tsv")).unwrap(), "123");
    }

    #[test]
    fn test_buffer_size_minimum() {
        let ops = FileOperations::new().with_buffer_size(10);
        assert_eq!(ops.buffer_size, 4096);
    }
}
