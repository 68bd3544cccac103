use std::fs;
use std::path::PathBuf;

use clap::Parser;
use lexi_cli::{Cli, load_config, read_documents, run};
use serde_json::Value;
use tempfile::TempDir;

fn write_contract(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("contract.txt");
    let pages = [
        "Page1 text about termination clauses",
        "Page2 text about payment terms",
        "Page3 text about liability",
    ];
    fs::write(&path, pages.join("\u{000C}")).unwrap();
    path
}

async fn run_args(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let mut out = Vec::new();
    run(cli, &mut out).await?;
    Ok(String::from_utf8(out)?)
}

#[tokio::test]
async fn ingest_reports_units_and_skipped_files() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(&dir);
    let broken = dir.path().join("broken.txt");
    fs::write(&broken, [0xff, 0xfe, 0xfd]).unwrap();

    let output = run_args(&[
        "lexi",
        "ingest",
        contract.to_str().unwrap(),
        broken.to_str().unwrap(),
        "--json",
    ])
    .await
    .unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["sources"][0]["source_id"], "contract.txt");
    assert_eq!(report["sources"][0]["units"], 3);
    assert_eq!(report["skipped"][0]["source_id"], "broken.txt");
    assert_eq!(report["fingerprint"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn ask_prints_passages_citation_and_messages() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(&dir);

    let output = run_args(&[
        "lexi",
        "ask",
        contract.to_str().unwrap(),
        "--query",
        "What does it say about payment?",
        "--json",
    ])
    .await
    .unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["passages"][0]["unit"]["content"], "Page2 text about payment terms");
    assert_eq!(report["passages"].as_array().unwrap().len(), 3);
    assert_eq!(report["citation"], "Sources: contract.txt");
    assert_eq!(report["messages"][0]["role"], "system");
    assert_eq!(report["messages"][1]["role"], "user");
    assert_eq!(report["messages"][1]["content"], "What does it say about payment?");
}

#[tokio::test]
async fn top_k_flag_limits_passages() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(&dir);

    let output = run_args(&[
        "lexi",
        "ask",
        contract.to_str().unwrap(),
        "-q",
        "payment",
        "--top-k",
        "1",
        "--json",
    ])
    .await
    .unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["passages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn text_output_is_readable() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(&dir);

    let output = run_args(&["lexi", "ask", contract.to_str().unwrap(), "--query", "payment"])
        .await
        .unwrap();

    assert!(output.starts_with("1. ["));
    assert!(output.contains("contract.txt (position 2, page 2)"));
    assert!(output.contains("Sources: contract.txt"));
    assert!(output.contains("--- system ---"));
    assert!(output.contains("--- user ---\npayment"));
}

#[tokio::test]
async fn settings_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let contract = write_contract(&dir);
    let config = dir.path().join("lexi.json");
    fs::write(&config, r#"{"directive": "Answer briefly.", "rag": {"top_k": 2}}"#).unwrap();

    let output = run_args(&[
        "lexi",
        "--config",
        config.to_str().unwrap(),
        "ask",
        contract.to_str().unwrap(),
        "--query",
        "payment",
        "--json",
    ])
    .await
    .unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["passages"].as_array().unwrap().len(), 2);
    assert!(report["messages"][0]["content"].as_str().unwrap().starts_with("Answer briefly."));
}

#[test]
fn invalid_settings_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("lexi.json");
    fs::write(&config, r#"{"temperature": 7.0}"#).unwrap();

    assert!(load_config(Some(&config)).is_err());
    assert!(load_config(None).is_ok());
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = read_documents(&[dir.path().join("absent.pdf")]).unwrap_err();
    assert!(err.to_string().contains("absent.pdf"));
}

#[test]
fn ask_requires_a_query() {
    assert!(Cli::try_parse_from(["lexi", "ask", "contract.pdf"]).is_err());
    assert!(Cli::try_parse_from(["lexi", "ingest"]).is_err());
}
