//! CLI behavior that needs no network access.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;
use regex::Regex;

fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

fn cli(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("moodguard").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .env_remove("MOODGUARD_API_BASE")
        .env_remove("MOODGUARD_MODEL")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn missing_api_key_fails_before_reading_input() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = write_file(&dir, "entries.csv", "text\nI feel ignored at home\n");
    cli(&dir)
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
}

#[test]
fn missing_text_column_is_an_ingestion_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = write_file(&dir, "entries.csv", "body\nI feel ignored at home\n");
    cli(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ingestion"));
}

#[test]
fn nonexistent_input_fails() {
    let dir = assert_fs::TempDir::new().unwrap();
    cli(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .arg(dir.path().join("nope.csv"))
        .assert()
        .failure();
}

#[test]
fn invalid_max_words_is_rejected() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = write_file(&dir, "entries.csv", "text\n");
    cli(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args([input.to_str().unwrap(), "--max-words", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("summary_max_words"));
}

#[test]
fn header_only_input_writes_an_empty_report() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = write_file(&dir, "entries.csv", "text,age\n");
    let out = dir.child("reports");
    cli(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args([
            input.to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
            "--chart",
            "donut",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Topic Classification (0 documents)"));

    let entries: Vec<PathBuf> = fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    assert_eq!(entries.len(), 1);
    let name = entries[0].file_name().unwrap().to_str().unwrap().to_string();
    let re = Regex::new(r"^\d{4}_\d{2}_\d{2}_\d{2}_\d{2}_\d{2}_\d{3}(_\d+)?_moodguard$").unwrap();
    assert!(re.is_match(&name), "unexpected dir name {name}");

    let report = &entries[0];
    assert!(report.join("labels.csv").exists());
    assert!(report.join("topics_donut.svg").exists());
    assert!(!report.join("topics_bar.svg").exists());
    assert!(!report.join("wordcloud.svg").exists());
    assert!(!report.join("summary.md").exists());
    let csv = fs::read_to_string(report.join("labels.csv")).unwrap();
    assert_eq!(csv.trim(), "Text Response,Label");
}

#[test]
fn no_export_leaves_output_dir_untouched() {
    let dir = assert_fs::TempDir::new().unwrap();
    let input = write_file(&dir, "entries.csv", "text\n");
    let out = dir.child("reports");
    cli(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args([
            input.to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
            "--no-export",
        ])
        .assert()
        .success();
    out.assert(predicate::path::missing());
}
