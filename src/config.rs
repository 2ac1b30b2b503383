use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub report: ReportConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives the project directory and the archive.
    pub base_directory: PathBuf,
    pub force_overwrite: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Keep the analysis report's own file name instead of `analysis_report.html`.
    pub keep_original_name: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// gzip level, 0-9.
    pub compression_level: u32,
    pub preserve_mtime: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force_overwrite: false,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            preserve_mtime: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ExportError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ExportError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ExportError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["dada2-export.toml", ".dada2-export.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        tracing::debug!(path = %default_path, "using configuration file");
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.base_directory = output_dir.clone();
        }

        if cli_args.force {
            self.output.force_overwrite = true;
        }

        if let Some(keep) = cli_args.keep_report_name {
            self.report.keep_original_name = keep;
        }

        if let Some(level) = cli_args.compression_level {
            self.archive.compression_level = level;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ExportError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ExportError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.compression_level > 9 {
            return Err(ExportError::Config {
                message: format!(
                    "Compression level must be between 0 and 9, got {}",
                    self.archive.compression_level
                ),
            });
        }

        if let Some(parent) = self.output.base_directory.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(ExportError::Config {
                    message: format!("Parent directory does not exist: {}", parent.display()),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.output.base_directory = PathBuf::from(".");
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub force: bool,
    pub keep_report_name: Option<bool>,
    pub compression_level: Option<u32>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_keep_report_name(mut self, keep: Option<bool>) -> Self {
        self.keep_report_name = keep;
        self
    }

    pub fn with_compression_level(mut self, level: Option<u32>) -> Self {
        self.compression_level = level;
        self
    }
}
