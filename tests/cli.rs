use std::io::Write;
use std::process::{Command, Stdio};

fn calc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_calc"))
}

fn stdout_of(args: &[&str]) -> String {
    let out = calc().args(args).output().expect("failed to run calc");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

// --- Inline expressions ---

#[test]
fn inline_scenarios() {
    assert_eq!(stdout_of(&["2+2"]), "4");
    assert_eq!(stdout_of(&["2*1+2"]), "4");
    assert_eq!(stdout_of(&["25/2"]), "12.5");
    assert_eq!(stdout_of(&["5-1"]), "4");
}

#[test]
fn inline_fractional_result() {
    let v: f64 = stdout_of(&["1.025*3+1"]).parse().unwrap();
    assert!((v - 4.075).abs() < 1e-6);
}

#[test]
fn inline_negation_and_grouping() {
    assert_eq!(stdout_of(&["-(2+3)*2"]), "-10");
}

#[test]
fn inline_division_by_zero() {
    assert_eq!(stdout_of(&["1/0"]), "inf");
}

#[test]
fn inline_multi_statement_prints_each() {
    assert_eq!(stdout_of(&["1+1 2*3 (-4)"]), "2\n6\n-4");
}

#[test]
fn tree_engine_agrees() {
    assert_eq!(stdout_of(&["--engine", "tree", "1+1 2*3 (-4)"]), "2\n6\n-4");
    assert_eq!(stdout_of(&["--engine", "tree", "25/2"]), "12.5");
}

#[test]
fn empty_program_prints_zero() {
    assert_eq!(stdout_of(&["# only a comment"]), "0");
}

// --- Emit ---

#[test]
fn emit_json_ast() {
    let out = stdout_of(&["--emit", "json", "1+2"]);
    let v: serde_json::Value = serde_json::from_str(&out).expect("valid JSON");
    let stmt = &v["statements"][0];
    assert!(stmt.get("Binary").is_some(), "expected a Binary node, got: {out}");
}

#[test]
fn emit_bytecode() {
    let out = stdout_of(&["--emit", "bytecode", "25/2"]);
    let lines: Vec<String> = out.lines().map(|l| l.split_whitespace().skip(1).collect::<Vec<_>>().join(" ")).collect();
    assert_eq!(lines, vec!["LOAD 25", "STORE r1", "LOAD 2", "DIVIDE r1", "END"]);
}

// --- File and stdin input ---

#[test]
fn file_input() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# scenario B").unwrap();
    writeln!(file, "1.025 * 3").unwrap();
    writeln!(file, "  + 1").unwrap();
    let out = stdout_of(&[file.path().to_str().unwrap()]);
    let v: f64 = out.parse().unwrap();
    assert!((v - 4.075).abs() < 1e-6);
}

#[test]
fn stdin_line_by_line() {
    let mut child = calc()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run calc");
    child.stdin.take().unwrap().write_all(b"2+2\n\n25/2\n").unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "4\n12.5");
}

#[test]
fn stdin_continues_after_error() {
    let mut child = calc()
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run calc");
    child.stdin.take().unwrap().write_all(b"1 +\n3*3\n").unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(!out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "9");
    assert!(String::from_utf8_lossy(&out.stderr).contains("CALC-P001"));
}

// --- Errors ---

#[test]
fn lex_error_reported() {
    let out = calc().arg("2 $ 2").output().expect("failed to run calc");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error[CALC-L001]"), "got: {stderr}");
    assert!(stderr.contains("2 $ 2"), "got: {stderr}");
    assert!(out.stdout.is_empty());
}

#[test]
fn unclosed_paren_reported() {
    let out = calc().arg("(1 + 2").output().expect("failed to run calc");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("CALC-P002"));
}

#[test]
fn register_exhaustion_reported() {
    let deep = format!("{}1{}", "1+(".repeat(16), ")".repeat(16));
    let out = calc().arg(&deep).output().expect("failed to run calc");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("CALC-C002"));

    // The tree engine has no register file.
    assert_eq!(stdout_of(&["--engine", "tree", &deep]), "17");
}

#[test]
fn deep_file_input_reports_error() {
    let cases = [
        vec!["1"; 200_000].join("+"),
        format!("{}1", "-".repeat(100_000)),
        format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000)),
    ];
    for source in cases {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        let out = calc().arg(file.path()).output().expect("failed to run calc");
        assert_eq!(out.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&out.stderr));
        assert!(String::from_utf8_lossy(&out.stderr).contains("CALC-P003"));
    }
}

#[test]
fn negative_zero_keeps_sign() {
    assert_eq!(stdout_of(&["0*-1"]), "-0");
}

#[test]
fn json_diagnostics() {
    let out = calc().args(["--json", "1 + 1.2.3"]).output().expect("failed to run calc");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    let v: serde_json::Value = serde_json::from_str(stderr.trim()).expect("valid JSON");
    assert_eq!(v["severity"], "error");
    assert_eq!(v["code"], "CALC-C001");
    assert_eq!(v["labels"][0]["start"], 4);
    assert_eq!(v["labels"][0]["end"], 9);
    assert_eq!(v["labels"][0]["col"], 5);
}

// --- Explain and trace ---

#[test]
fn explain_known_code() {
    let out = stdout_of(&["--explain", "CALC-C002"]);
    assert!(out.starts_with("## CALC-C002"), "got: {out}");
}

#[test]
fn explain_unknown_code() {
    let out = calc().args(["--explain", "CALC-NOPE"]).output().expect("failed to run calc");
    assert!(!out.status.success());
}

#[test]
fn trace_logs_to_stderr() {
    let out = calc().args(["--trace", "25/2"]).output().expect("failed to run calc");
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "12.5");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("STORE r1"), "got: {stderr}");
    assert!(stderr.contains("DIVIDE r1"), "got: {stderr}");
}
