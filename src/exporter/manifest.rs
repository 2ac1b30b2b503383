use crate::error::{ExportError, Result};
use crate::exporter::project_tree::format_date;
use crate::layout::MANIFEST_FILE;
use chrono::NaiveDate;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "dada2_report.html",
        "Metrics on the dada2 run including reads input and output and taxonomic assignments.",
    ),
    (
        "abundance_table.tsv",
        "Read counts for each amplicon sequence variant (ASV)(rows) detected per sample (columns).",
    ),
    (
        "taxonomy_table.tsv",
        "Sequence and taxonomic classification assigned to each ASV",
    ),
    (
        "merged_table.tsv",
        "Merge of abundance and taxonomy table, while dropping sequence and ASV identifiers.",
    ),
];

const ANALYSIS_REPORT_DESCRIPTION: &str =
    "Summary of the analysis performed, with feedback from OCMS";

/// Render `Files.txt`: layout diagram, description block, creation date.
pub fn render_manifest(project_name: &str, report_name: &str, date: NaiveDate) -> String {
    let mut text = String::new();

    text.push('\n');
    text.push_str("Directory structure\n");
    text.push_str("--------------------\n");
    text.push('\n');
    text.push_str(&format!("|-{}\n", project_name));
    text.push_str(&format!("|---{}\n", MANIFEST_FILE));
    text.push_str("|------Reports\n");
    text.push_str(&format!("|---------{}\n", report_name));
    text.push_str("|---------dada2_report.html\n");
    text.push_str("|------Data\n");
    text.push_str("|---------abundance_table.tsv\n");
    text.push_str("|---------merged_table.tsv\n");
    text.push_str("|---------taxonomy_table.tsv\n");
    text.push('\n');
    text.push_str("Description\n");
    text.push_str("------------\n");
    text.push('\n');
    text.push_str(&format!("{} -> {}\n", report_name, ANALYSIS_REPORT_DESCRIPTION));
    for (name, description) in DESCRIPTIONS {
        text.push_str(&format!("{} -> {}\n", name, description));
    }
    text.push('\n');
    text.push_str(&format!("file created: {}", format_date(date)));

    text
}

/// Write the manifest at the project root and return its path.
pub fn write_manifest(
    project_dir: &Path,
    project_name: &str,
    report_name: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let path = project_dir.join(MANIFEST_FILE);
    let content = render_manifest(project_name, report_name, date);

    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()
    };

    write().map_err(|source| ExportError::Manifest {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote manifest");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ANALYSIS_REPORT_NAME;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    #[test]
    fn test_manifest_ends_with_date_line() {
        let text = render_manifest("demo", ANALYSIS_REPORT_NAME, date());
        assert!(text.ends_with("file created: 07-03-2024"));
        assert_eq!(
            text.lines().filter(|l| l.starts_with("file created:")).count(),
            1
        );
    }

    #[test]
    fn test_manifest_lists_layout() {
        let text = render_manifest("demo", ANALYSIS_REPORT_NAME, date());

        assert!(text.contains("|-demo\n"));
        assert!(text.contains("|---Files.txt\n"));
        for name in [
            "analysis_report.html",
            "dada2_report.html",
            "abundance_table.tsv",
            "merged_table.tsv",
            "taxonomy_table.tsv",
        ] {
            assert!(text.contains(&format!("|---------{}\n", name)), "{}", name);
            assert!(text.contains(&format!("{} -> ", name)), "{}", name);
        }
    }

    #[test]
    fn test_manifest_uses_kept_report_name() {
        let text = render_manifest("demo", "summary.html", date());
        assert!(text.contains("|---------summary.html\n"));
        assert!(text.contains("summary.html -> Summary of the analysis"));
        assert!(!text.contains("analysis_report.html"));
    }

    #[test]
    fn test_write_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(temp_dir.path(), "demo", ANALYSIS_REPORT_NAME, date()).unwrap();

        assert_eq!(path, temp_dir.path().join("Files.txt"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_manifest("demo", ANALYSIS_REPORT_NAME, date()));
    }

    #[test]
    fn test_write_manifest_into_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");
        let err = write_manifest(&missing, "demo", ANALYSIS_REPORT_NAME, date()).unwrap_err();
        assert!(matches!(err, ExportError::Manifest { .. }));
    }
}
