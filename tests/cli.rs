use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RUN_FILES: &[&str] = &[
    "abundance.dir/taxa_abundances.tsv",
    "abundance.dir/merged_abundance_id.tsv",
    "taxonomy.dir/merged_taxonomy.tsv",
    "report.dir/report.html",
];

fn populate(root: &Path) -> (PathBuf, PathBuf) {
    let run = root.join("dada2");
    for relative in RUN_FILES {
        let path = run.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, relative.as_bytes()).unwrap();
    }
    let report = root.join("report_final.html");
    fs::write(&report, "<html/>").unwrap();
    (run, report)
}

fn command(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dada2-export").unwrap();
    cmd.current_dir(cwd)
        .env_remove("DADA2_EXPORT_OUTPUT_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn exports_into_working_directory() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--date=01-01-2024")
        .arg("--output-format=plain")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo_01-01-2024.tar.gz"));

    assert!(temp.path().join("demo_01-01-2024.tar.gz").is_file());
    assert!(temp.path().join("demo/Files.txt").is_file());
    assert!(temp.path().join("demo/Data/merged_table.tsv").is_file());
}

#[test]
fn accepts_dada2_dir_alias() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    command(temp.path())
        .arg("--dada2-dir")
        .arg(&run)
        .arg("--report-file")
        .arg(&report)
        .arg("--project-name")
        .arg("alias")
        .arg("--date=02-02-2024")
        .arg("-q")
        .assert()
        .success();

    assert!(temp.path().join("alias_02-02-2024.tar.gz").is_file());
}

#[test]
fn manifest_defaults_to_today() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=today")
        .arg("-q")
        .assert()
        .success();

    let today = chrono::Local::now().date_naive().format("%d-%m-%Y").to_string();
    let manifest = fs::read_to_string(temp.path().join("today/Files.txt")).unwrap();
    assert!(manifest.ends_with(&format!("file created: {}", today)));
    assert!(temp
        .path()
        .join(format!("today_{}.tar.gz", today))
        .is_file());
}

#[test]
fn missing_input_exits_nonzero_with_path() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());
    fs::remove_file(run.join("taxonomy.dir/merged_taxonomy.tsv")).unwrap();

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--date=01-01-2024")
        .arg("--output-format=plain")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("merged_taxonomy.tsv"))
        .stderr(predicate::str::contains("resolve inputs"));

    assert!(!temp.path().join("demo_01-01-2024.tar.gz").exists());
}

#[test]
fn existing_project_requires_force() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());
    let args = [
        format!("--source-dir={}", run.display()),
        format!("--report-file={}", report.display()),
        "--project-name=demo".to_string(),
        "--date=01-01-2024".to_string(),
        "-q".to_string(),
    ];

    command(temp.path()).args(&args).assert().success();

    command(temp.path())
        .args(&args)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("already exists"));

    command(temp.path())
        .args(&args)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn json_output_is_a_report_document() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    let output = command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--date=01-01-2024")
        .arg("--output-format=json")
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["project_name"], "demo");
    assert_eq!(value["date"], "01-01-2024");
    assert_eq!(value["files"].as_array().unwrap().len(), 5);
}

#[test]
fn dry_run_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--date=01-01-2024")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reports/dada2_report.html"))
        .stdout(predicate::str::contains("demo_01-01-2024.tar.gz"));

    assert!(!temp.path().join("demo").exists());
    assert!(!temp.path().join("demo_01-01-2024.tar.gz").exists());
}

#[test]
fn rejects_project_name_with_separator() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=a/b")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid project name"));
}

#[test]
fn output_dir_option_places_results() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());
    let out = temp.path().join("deliveries");

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--date=01-01-2024")
        .arg(format!("--output-dir={}", out.display()))
        .arg("-q")
        .assert()
        .success();

    assert!(out.join("demo/Reports/analysis_report.html").is_file());
    assert!(out.join("demo_01-01-2024.tar.gz").is_file());
}

#[test]
fn generate_config_writes_sample() {
    let temp = TempDir::new().unwrap();

    command(temp.path())
        .arg("--generate-config")
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join("dada2-export.toml")).unwrap();
    assert!(content.contains("[archive]"));
    assert!(content.contains("compression_level"));
}

#[test]
fn output_dir_that_is_a_file_exits_with_create_tree_code() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());
    let out = temp.path().join("deliveries");
    fs::write(&out, "not a directory").unwrap();

    command(temp.path())
        .arg(format!("--source-dir={}", run.display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg(format!("--output-dir={}", out.display()))
        .arg("--output-format=plain")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("create tree"))
        .stderr(predicate::str::contains("deliveries"));
}

#[test]
fn delivered_archive_blocks_rerun_without_force() {
    let temp = TempDir::new().unwrap();
    let (run, report) = populate(temp.path());
    let args = [
        format!("--source-dir={}", run.display()),
        format!("--report-file={}", report.display()),
        "--project-name=demo".to_string(),
        "--date=01-01-2024".to_string(),
        "-q".to_string(),
    ];

    command(temp.path()).args(&args).assert().success();
    fs::remove_dir_all(temp.path().join("demo")).unwrap();

    command(temp.path())
        .args(&args)
        .arg("--dry-run")
        .assert()
        .code(3);

    command(temp.path())
        .args(&args)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Archive already exists"));

    assert!(!temp.path().join("demo").exists());
}

#[test]
fn mistyped_source_dir_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let (_run, report) = populate(temp.path());

    command(temp.path())
        .arg(format!("--source-dir={}", temp.path().join("dada").display()))
        .arg(format!("--report-file={}", report.display()))
        .arg("--project-name=demo")
        .arg("--output-format=plain")
        .assert()
        .code(4);

    assert!(!temp.path().join("demo").exists());
}
