#![forbid(unsafe_code)]

mod support;

use std::process::Command;
use support::temp_dir;

#[test]
fn cli_help_exits_zero_and_does_not_create_store() {
    let exe = env!("CARGO_BIN_EXE_sb_rpc");
    let dir = temp_dir("help");

    let output = Command::new(exe)
        .arg("--help")
        .current_dir(&dir)
        .output()
        .expect("run sb_rpc --help");

    assert!(
        output.status.success(),
        "expected zero exit (stderr={})",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE:"), "help must include USAGE");
    assert!(stdout.contains("--storage-dir"), "help must list flags");
    assert!(
        !dir.join(".salesboard").exists(),
        "--help should not open the default store"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cli_version_exits_zero_and_includes_pkg_version() {
    let exe = env!("CARGO_BIN_EXE_sb_rpc");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run sb_rpc --version");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "version output must include crate version (got={stdout})"
    );
    assert!(
        stdout.contains("schema="),
        "version output must include the schema version"
    );
}

#[test]
fn invalid_config_exits_nonzero() {
    let exe = env!("CARGO_BIN_EXE_sb_rpc");
    let dir = temp_dir("bad_config");
    let output = Command::new(exe)
        .arg("--storage-dir")
        .arg(&dir)
        .args(["--window-days", "0"])
        .output()
        .expect("run sb_rpc with bad window");
    assert!(!output.status.success());
    let _ = std::fs::remove_dir_all(&dir);
}
