//! Drives the `tacc` binary the way a build script would.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn tacc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tacc"))
        .args(args)
        .output()
        .expect("failed to spawn tacc")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_build_writes_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("sum.s");
    let input = fixture("sum_loop.json");
    let out = tacc(&[
        "build",
        input.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
        "--emit-tac",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let asm = std::fs::read_to_string(&out_path).unwrap();
    assert!(asm.starts_with(".data\n.text\nmain:\n"));
    assert!(asm.ends_with("    li $v0, 10\n    syscall\n"));

    let listing = std::fs::read_to_string(dir.path().join("sum.tac")).unwrap();
    assert!(listing.starts_with("main:\n    BeginFunc 20\n"));
}

#[test]
fn test_build_selects_return_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let input = fixture("add_call.json");
    let ra_path = dir.path().join("ra.s");
    let tramp_path = dir.path().join("tramp.s");

    let ra = tacc(&["build", input.to_str().unwrap(), "-o", ra_path.to_str().unwrap()]);
    let tramp = tacc(&[
        "build",
        input.to_str().unwrap(),
        "-o",
        tramp_path.to_str().unwrap(),
        "--return-protocol",
        "trampoline",
    ]);
    assert!(ra.status.success() && tramp.status.success());

    let ra_asm = std::fs::read_to_string(&ra_path).unwrap();
    let tramp_asm = std::fs::read_to_string(&tramp_path).unwrap();
    assert!(ra_asm.contains("    jr $ra\n"));
    assert!(ra_asm.contains("add:\n    addiu $sp, $sp, -16\n    sw $ra, 0($sp)\n"));
    assert!(tramp_asm.contains("\nf1:\n"));
    assert!(!tramp_asm.contains("jr $ra"));
}

#[test]
fn test_tac_prints_listing_after_passes() {
    let input = fixture("echo_clamp.json");
    let out = tacc(&["tac", input.to_str().unwrap(), "--pass", "fold", "--pass", "dce"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with("    limit := 10\nmain:\n"));
    assert!(text.contains("    t1 call readIntFromSTDIN 0\n"));
    assert!(text.ends_with("    EndFunc\n"));
}

#[test]
fn test_run_prints_values() {
    let input = fixture("sum_loop.json");
    let out = tacc(&["run", input.to_str().unwrap(), "-O"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "15\n");

    let input = fixture("echo_clamp.json");
    let out = tacc(&["run", input.to_str().unwrap(), "--input", "-3"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "-3\n");
}

#[test]
fn test_run_reports_exhausted_input() {
    let input = fixture("echo_clamp.json");
    let out = tacc(&["run", input.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(stderr(&out).starts_with("error: "));
}

#[test]
fn test_rejects_unknown_pass() {
    let input = fixture("sum_loop.json");
    let out = tacc(&["tac", input.to_str().unwrap(), "--pass", "inline"]);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("unknown pass `inline`"));
}

#[test]
fn test_missing_input_fails() {
    let out = tacc(&["build", "/nonexistent/tree.json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("error: cannot read /nonexistent/tree.json"));
}
