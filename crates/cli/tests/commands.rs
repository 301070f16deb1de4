use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const TRACE: &str = r#"RegisterPackage("example.com/p"): gocovObject0
gocovObject0.RegisterFunction("F", "/src/p/f.go", 0, 40): gocovObject1
gocovObject1.RegisterStatement(10, 20): gocovObject2
gocovObject1.RegisterStatement(21, 30): gocovObject3
gocovObject1.Enter()
gocovObject2.At()
gocovObject1.Leave()
"#;

const CALC: &str = "package calc

func Add(a, b int) int {
	return a + b
}

func Abs(a int) int {
	if a < 0 {
		return -a
	}
	return a
}
";

const PROFILE: &str = "mode: count
example.com/m/calc/calc.go:3.24,5.2 1 4
example.com/m/calc/calc.go:7.21,8.12 1 2
example.com/m/calc/calc.go:8.12,10.3 1 0
example.com/m/calc/calc.go:11.2,11.10 1 2
";

#[allow(deprecated)]
fn gocov() -> Command {
    let mut cmd = Command::cargo_bin("gocov").expect("binary");
    cmd.arg("--quiet");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn reached(function: &Value) -> Vec<i64> {
    function["Statements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["Reached"].as_i64().unwrap())
        .collect()
}

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn trace_builds_report_and_skips_malformed_logs() {
    let dir = tempdir().unwrap();
    let good = write(dir.path(), "good.log", TRACE);
    let bad = write(dir.path(), "bad.log", "this is not a trace\n");

    let report = run_json(gocov().arg("trace").arg(&good).arg(&bad));
    let package = &report["Packages"][0];
    assert_eq!(package["Name"], "example.com/p");
    let function = &package["Functions"][0];
    assert_eq!(function["Name"], "F");
    assert_eq!(function["Entered"], 1);
    assert_eq!(reached(function), vec![1, 0]);
}

#[test]
fn trace_merges_runs_of_the_same_program() {
    let dir = tempdir().unwrap();
    let first = write(dir.path(), "1.log", TRACE);
    let second = write(dir.path(), "2.log", TRACE);

    let report = run_json(gocov().args(["trace", "--jobs", "2"]).arg(&first).arg(&second));
    let function = &report["Packages"][0]["Functions"][0];
    assert_eq!(function["Left"], 2);
    assert_eq!(reached(function), vec![2, 0]);
}

#[test]
fn trace_aborts_on_identity_violation() {
    let dir = tempdir().unwrap();
    let corrupt = write(dir.path(), "corrupt.log", "RegisterPackage(\"p\"): gocovObject3\n");

    gocov()
        .arg("trace")
        .arg(&corrupt)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Corrupt trace"));
}

#[test]
fn merge_sums_reports() {
    let dir = tempdir().unwrap();
    let trace = write(dir.path(), "t.log", TRACE);
    let output = gocov().arg("trace").arg(&trace).output().unwrap();
    let json = write(dir.path(), "a.json", &String::from_utf8(output.stdout).unwrap());

    let merged = run_json(gocov().arg("merge").arg(&json).arg(&json));
    let function = &merged["Packages"][0]["Functions"][0];
    assert_eq!(function["Entered"], 2);
    assert_eq!(reached(function), vec![2, 0]);
}

#[test]
fn merge_skips_mismatched_packages() {
    let dir = tempdir().unwrap();
    let trace = write(dir.path(), "t.log", TRACE);
    let other = write(dir.path(), "o.log", &TRACE.replace("0, 40", "0, 41"));
    let a = gocov().arg("trace").arg(&trace).output().unwrap();
    let b = gocov().arg("trace").arg(&other).output().unwrap();
    let a = write(dir.path(), "a.json", &String::from_utf8(a.stdout).unwrap());
    let b = write(dir.path(), "b.json", &String::from_utf8(b.stdout).unwrap());

    let merged = run_json(gocov().arg("merge").arg(&a).arg(&b));
    let function = &merged["Packages"][0]["Functions"][0];
    assert_eq!(function["End"], 40);
    assert_eq!(function["Entered"], 1);
}

#[test]
fn report_reads_stdin() {
    let dir = tempdir().unwrap();
    let trace = write(dir.path(), "t.log", TRACE);
    let output = gocov().arg("trace").arg(&trace).output().unwrap();

    gocov()
        .arg("report")
        .write_stdin(output.stdout)
        .assert()
        .success()
        .stdout("example.com/p/f.go  F  50.00% (1/2)\nTotal coverage: 50.00% (1/2)\n\n");
}

#[test]
fn convert_uses_module_from_go_mod() {
    let dir = tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/m\n\ngo 1.21\n");
    write(dir.path(), "calc/calc.go", CALC);
    let profile = write(dir.path(), "cover.out", PROFILE);

    let report = run_json(gocov().arg("convert").arg("--root").arg(dir.path()).arg(&profile));
    let package = &report["Packages"][0];
    assert_eq!(package["Name"], "example.com/m/calc");
    assert_eq!(package["Functions"][0]["Name"], "Add");
    assert_eq!(reached(&package["Functions"][0]), vec![4]);
    assert_eq!(reached(&package["Functions"][1]), vec![0, 2]);
}

#[test]
fn convert_rejects_malformed_profiles() {
    let dir = tempdir().unwrap();
    let profile = write(dir.path(), "cover.out", "mode: set\nnot a block\n");

    gocov()
        .arg("convert")
        .arg("--root")
        .arg(dir.path())
        .arg(&profile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid cover profile"));
}

#[test]
fn instrument_single_file_to_stdout() {
    let dir = tempdir().unwrap();
    let src = write(dir.path(), "f.go", "package p\n\nfunc F() {\n\tx()\n}\n");

    gocov()
        .args(["instrument", "--package", "example.com/p"])
        .arg(&src)
        .assert()
        .success()
        .stdout(predicate::str::contains("gocovObject2.At(); x()"))
        .stdout(predicate::str::contains("gocovObject1.Enter()"));
}

#[test]
fn instrument_writes_under_import_path() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "src/a.go", "package p\n\nfunc A() {\n\ta()\n}\n");
    let b = write(dir.path(), "src/b.go", "package p\n\nfunc B() {\n\tb()\n}\n");
    let out = dir.path().join("out");

    gocov()
        .args(["instrument", "--package", "example.com/p", "--no-functions", "--out"])
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    let written = fs::read_to_string(out.join("example.com/p/b.go")).unwrap();
    assert!(written.contains(".At(); b()"));
    assert!(!written.contains("Enter()"));
    assert!(out.join("example.com/p/a.go").is_file());
}

#[test]
fn instrument_needs_out_for_several_files() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.go", "package p\n");
    let b = write(dir.path(), "b.go", "package p\n");

    gocov()
        .args(["instrument", "--package", "example.com/p"])
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

#[test]
fn instrument_rejects_bad_rewrite() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.go", "package p\n");

    gocov()
        .args(["instrument", "--package", "example.com/p", "--rewrite", "nothing"])
        .arg(&a)
        .assert()
        .failure();
}

#[test]
fn extents_dumps_functions() {
    let dir = tempdir().unwrap();
    let src = write(dir.path(), "calc.go", CALC);

    let funcs = run_json(gocov().arg("extents").arg(&src));
    let names: Vec<&str> = funcs
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Add", "Abs"]);
}
