use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn appraise_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("appraise");
    path
}

fn setup_test_env(config_content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("appraise.toml");
    fs::write(&config_path, config_content).unwrap();

    let report: String = "The project aligns with SDG 4 and the partner country's education plan. "
        .chars()
        .cycle()
        .take(3_000)
        .collect();
    fs::write(root.join("report.txt"), report).unwrap();
    fs::write(root.join("blank.txt"), "   \n\n").unwrap();

    (tmp, config_path)
}

const OFFLINE_CONFIG: &str = r#"
[embedding]
provider = "disabled"

[rate_limit]
delay_ms = 0
batch_delay_ms = 0
"#;

fn run_appraise(config_path: &Path, args: &[&str], envs: &[(&str, &str)]) -> (String, String, bool) {
    let binary = appraise_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--progress")
        .arg("off")
        .args(args)
        .env_remove("GEMINI_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env("RUST_LOG", "warn");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run appraise binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_extract_reports_chunks() {
    let (tmp, config_path) = setup_test_env(OFFLINE_CONFIG);
    let report = tmp.path().join("report.txt");

    let (stdout, stderr, success) =
        run_appraise(&config_path, &["extract", report.to_str().unwrap()], &[]);
    assert!(success, "extract failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("characters: 3000"));
    assert!(stdout.contains("chunks: 3 (chunk_size 1500, overlap 200)"));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let (tmp, _) = setup_test_env(OFFLINE_CONFIG);
    let report = tmp.path().join("report.txt");
    let absent = tmp.path().join("nope.toml");

    let (stdout, _, success) = run_appraise(&absent, &["extract", report.to_str().unwrap()], &[]);
    assert!(success);
    assert!(stdout.contains("chunks: 3"));
}

#[test]
fn test_bad_overlap_is_config_error() {
    let (tmp, config_path) = setup_test_env("[chunking]\nchunk_size = 500\noverlap = 500\n");
    let report = tmp.path().join("report.txt");

    let (_, stderr, success) =
        run_appraise(&config_path, &["extract", report.to_str().unwrap()], &[]);
    assert!(!success);
    assert!(stderr.contains("chunking.overlap"), "stderr: {}", stderr);
}

#[test]
fn test_audit_requires_api_key() {
    let (tmp, _) = setup_test_env(OFFLINE_CONFIG);
    let config_path = tmp.path().join("config/appraise.toml");
    fs::write(&config_path, "").unwrap();
    let report = tmp.path().join("report.txt");

    let (_, stderr, success) = run_appraise(&config_path, &["audit", report.to_str().unwrap()], &[]);
    assert!(!success);
    assert!(stderr.contains("GEMINI_API_KEY"), "stderr: {}", stderr);
}

#[test]
fn test_audit_of_blank_document_fails_before_indexing() {
    let (tmp, config_path) = setup_test_env(OFFLINE_CONFIG);
    let blank = tmp.path().join("blank.txt");

    let (stdout, stderr, success) = run_appraise(
        &config_path,
        &["audit", blank.to_str().unwrap()],
        &[("GEMINI_API_KEY", "test-key")],
    );
    assert!(!success, "stdout: {}", stdout);
    assert!(stderr.contains("no extractable text"), "stderr: {}", stderr);
}

#[test]
fn test_index_with_disabled_embedder_falls_back() {
    let (tmp, config_path) = setup_test_env(OFFLINE_CONFIG);
    let report = tmp.path().join("report.txt");

    let (stdout, stderr, success) = run_appraise(
        &config_path,
        &["index", report.to_str().unwrap(), "--query", "SDG", "--k", "2"],
        &[],
    );
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("chunks: 3"));
    assert!(stdout.contains("embeddings: 3"));
    assert!(stdout.contains("zero vectors: 3"));
    assert!(stdout.contains("ranked search unavailable"));
    assert!(stdout.contains("2. "));
}

#[test]
fn test_unsupported_extension() {
    let (tmp, config_path) = setup_test_env(OFFLINE_CONFIG);
    let docx = tmp.path().join("report.docx");
    fs::write(&docx, b"PK").unwrap();

    let (_, stderr, success) = run_appraise(&config_path, &["extract", docx.to_str().unwrap()], &[]);
    assert!(!success);
    assert!(stderr.contains("unsupported content-type"), "stderr: {}", stderr);
}
