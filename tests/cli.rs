use std::fs;
use std::process::Command;

#[test]
fn cli_roundtrip() {
    let comp = env!("CARGO_BIN_EXE_compressor");
    let decomp = env!("CARGO_BIN_EXE_decompressor");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.bin");
    let packed = dir.path().join("input.enpakk");
    let output = dir.path().join("output.bin");

    fs::write(&input, b"ABCD").unwrap();

    let status = Command::new(comp)
        .args([input.to_str().unwrap(), packed.to_str().unwrap()])
        .status()
        .expect("compress failed");
    assert!(status.success());
    assert_eq!(fs::read(&packed).unwrap().len(), 6);

    let status = Command::new(decomp)
        .args([
            packed.to_str().unwrap(),
            output.to_str().unwrap(),
            "--verbose",
            "--seed",
            "3",
        ])
        .status()
        .expect("decompress failed");
    assert!(status.success());
    assert_eq!(fs::read(&output).unwrap(), b"ABCD");
}

#[test]
fn short_input_fails_without_output() {
    let decomp = env!("CARGO_BIN_EXE_decompressor");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.enpakk");
    let output = dir.path().join("out.bin");
    fs::write(&input, [1u8, 2, 3, 4]).unwrap();

    let result = Command::new(decomp)
        .args([input.to_str().unwrap(), output.to_str().unwrap()])
        .output()
        .expect("run failed");
    assert_eq!(result.status.code(), Some(1));
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Verify the file is an intact"));
}

#[test]
fn missing_input_fails() {
    let decomp = env!("CARGO_BIN_EXE_decompressor");
    let dir = tempfile::tempdir().unwrap();
    let result = Command::new(decomp)
        .args([
            dir.path().join("nope.enpakk").to_str().unwrap(),
            dir.path().join("out.bin").to_str().unwrap(),
        ])
        .output()
        .expect("run failed");
    assert_eq!(result.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&result.stderr).contains("Check that the file exists"));
}

#[test]
fn exhausted_budget_reports_json_and_fails() {
    let decomp = env!("CARGO_BIN_EXE_decompressor");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.enpakk");
    let output = dir.path().join("out.bin");
    // CRC-32 of [0x00, 0x01] under hash 0x00: no candidate matches
    let mut bytes = 0x36DE_2269u32.to_le_bytes().to_vec();
    bytes.push(0x00);
    fs::write(&input, bytes).unwrap();

    let result = Command::new(decomp)
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--backend",
            "exhaustive",
            "--json",
        ])
        .output()
        .expect("run failed");
    assert_eq!(result.status.code(), Some(1));
    assert!(!output.exists());
    let report: serde_json::Value = serde_json::from_slice(&result.stdout).unwrap();
    assert_eq!(report["backend"], "exhaustive");
    assert_eq!(report["found"], false);
}

#[test]
fn config_file_is_honoured() {
    let decomp = env!("CARGO_BIN_EXE_decompressor");
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.enpakk");
    let output = dir.path().join("out.bin");
    let config = dir.path().join("enpakk.json");
    fs::write(&input, enpakk::compress(b"hi")).unwrap();
    fs::write(&config, r#"{"backend": "exhaustive", "max_attempts": 2}"#).unwrap();

    let status = Command::new(decomp)
        .args([
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .status()
        .expect("run failed");
    assert!(status.success());
    assert_eq!(fs::read(&output).unwrap(), b"hi");
}

#[test]
fn bucket_dump_writes_one_row_per_hash() {
    let exe = env!("CARGO_BIN_EXE_bucket_dump");
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("buckets.csv");
    let status = Command::new(exe)
        .args([csv_path.to_str().unwrap(), "--max-candidates", "200"])
        .status()
        .expect("run failed");
    assert!(status.success());
    let text = fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("hash,count,true_size,truncated,first_block"));
    assert_eq!(lines.next(), Some("0,200,256,true,0000"));
    assert_eq!(text.lines().count(), 257);
}
