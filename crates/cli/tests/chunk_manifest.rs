use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn chunkprep() -> Command {
    let mut cmd = Command::cargo_bin("chunkprep").expect("binary");
    for var in [
        "PROMPT_CHUNK_TOKEN_LIMIT",
        "PROMPT_CHUNK_MAX_SINGLE_FILE_SIZE_MB",
        "PROMPT_CHUNK_MAX_TOTAL_FILES_SIZE_MB",
        "PROMPT_CHUNK_MAX_FILES",
        "PROMPT_CHUNK_SPLIT_STRATEGY",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn chunks_manifest_file_with_attachments() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("assets/login.png"), vec![0u8; 10]).unwrap();
    fs::write(root.join("assets/error.png"), vec![0u8; 20]).unwrap();
    fs::write(
        root.join("items.json"),
        r#"[
            "Summarize the attached screenshots",
            {"key": "login.png", "file": "assets/login.png"},
            {"key": "error.png", "file": "assets/error.png"},
            {"key": "priority", "value": 2}
        ]"#,
    )
    .unwrap();

    let output = chunkprep()
        .arg("--manifest")
        .arg(root.join("items.json"))
        .args(["--max-files", "1", "--quiet"])
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");

    let body = stdout_json(&output);
    let chunks = body["chunks"].as_array().expect("chunks array");
    assert_eq!(chunks.len(), 2);
    assert_eq!(
        chunks[0]["text"],
        "Summarize the attached screenshots,\nlogin.png"
    );
    assert_eq!(chunks[0]["files"][0]["size"], 10);
    assert_eq!(chunks[1]["text"], "error.png\npriority=2");
    assert_eq!(chunks[1]["total_files_size"], 20);
    assert_eq!(body["stats"]["total_chunks"], 2);
    assert_eq!(body["stats"]["total_files_size"], 30);
}

#[test]
fn reads_manifest_from_stdin_and_honours_env_limits() {
    let output = chunkprep()
        .env("PROMPT_CHUNK_TOKEN_LIMIT", "2")
        .arg("--quiet")
        .write_stdin(r#"["one two", "three", {"text": "four five six"}]"#)
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");

    let body = stdout_json(&output);
    let texts: Vec<&str> = body["chunks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|chunk| chunk["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["one two", "three", "four five", "six"]);
}

#[test]
fn token_limit_flag_beats_environment() {
    let output = chunkprep()
        .env("PROMPT_CHUNK_TOKEN_LIMIT", "1")
        .args(["--token-limit", "10", "--quiet"])
        .write_stdin(r#"["a b", "c d"]"#)
        .output()
        .expect("command run");
    assert!(output.status.success(), "{output:?}");
    let body = stdout_json(&output);
    assert_eq!(body["chunks"][0]["text"], "a b\nc d");
}

#[test]
fn missing_attachment_fails_with_path() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("items.json"), r#"[{"file": "missing.pdf"}]"#).unwrap();

    chunkprep()
        .arg("--manifest")
        .arg(temp.path().join("items.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.pdf"));
}

#[test]
fn zero_token_limit_is_rejected() {
    chunkprep()
        .args(["--token-limit", "0"])
        .write_stdin("[]")
        .assert()
        .failure()
        .stderr(predicate::str::contains("token_limit"));
}
