//! CLI integration tests: drive the `bootcodec` binary as a black box via
//! `std::process::Command`.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn bootcodec_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_bootcodec") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("bootcodec");
    p
}

fn crc32(data: &[u8]) -> u32 {
    bootcodec::crc32::crc32(data, 0)
}

fn build_gzip_member(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x1F, 0x8B, 0x08, 0, 0, 0, 0, 0, 0x00, 0xFF];
    out.push(0b0000_0001);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.extend_from_slice(&(!(payload.len() as u16)).to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc32(payload).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out
}

#[test]
fn gzip_decode_subcommand_round_trips() {
    let dir = TempDir::new().unwrap();
    let payload = b"the quick brown fox jumps over the lazy dog\n".repeat(4);
    let input_path = dir.path().join("in.gz");
    let output_path = dir.path().join("out.bin");
    fs::write(&input_path, build_gzip_member(&payload)).unwrap();

    let status = Command::new(bootcodec_bin())
        .args(["gzip-decode"])
        .arg(&input_path)
        .arg(&output_path)
        .status()
        .expect("failed to run bootcodec");
    assert!(status.success());

    let produced = fs::read(&output_path).unwrap();
    assert_eq!(produced, payload);
}

#[test]
fn inspect_subcommand_reports_a_terminator_only_stream() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("payload.bin");
    fs::write(&input_path, [0u8, 0, 0, 0]).unwrap();

    let output = Command::new(bootcodec_bin())
        .arg("inspect")
        .arg(&input_path)
        .output()
        .expect("failed to run bootcodec");
    assert!(output.status.success());
}

#[test]
fn missing_input_file_exits_with_an_error() {
    let status = Command::new(bootcodec_bin())
        .args(["gzip-decode", "/nonexistent/path.gz", "/tmp/out.bin"])
        .status()
        .expect("failed to run bootcodec");
    assert!(!status.success());
}
