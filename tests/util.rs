#![allow(dead_code)]
use assert_cmd::Command;
use std::io::Write;
use tempfile::NamedTempFile;

pub const SUCCESS: i32 = 0;
pub const EX_USAGE: i32 = 64;
pub const EX_SOFTWARE: i32 = 70;

/// Writes `source` to a scratch file and runs it through the `rlox`
/// binary, asserting on stdout and exit code the way the teacher's own
/// `util.rs` drove its CLI under test.
pub fn run_script(source: &str) -> assert_cmd::assert::Assert {
    let mut temp_file = NamedTempFile::new().expect("failed to create temp file");
    write!(temp_file, "{source}").expect("failed to write to temp file");

    let mut cmd = Command::cargo_bin("rlox").expect("binary not found");
    cmd.arg(temp_file.path());
    cmd.assert()
}

pub fn assert_stdout(source: &str, expected_stdout: &str, expected_code: i32) {
    run_script(source)
        .code(expected_code)
        .stdout(expected_stdout.to_string());
}
