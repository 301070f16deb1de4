use gocov_profile::{parse_profiles, IngestConfig, Ingested, Ingester, ProfileError, SourceResolver};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::{tempdir, TempDir};

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

const UTIL: &str = "package util

func Noop() {}
";

const PROFILE: &str = "mode: count
example.com/m/calc/calc.go:3.24,5.2 1 4
example.com/m/calc/calc.go:7.21,8.12 1 2
example.com/m/calc/calc.go:8.12,10.3 1 0
example.com/m/calc/calc.go:11.2,11.10 1 2
example.com/m/util/util.go:3.13,3.15 0 1
example.com/m/missing/gone.go:1.1,2.2 1 1
";

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("calc")).unwrap();
    fs::create_dir_all(dir.path().join("util")).unwrap();
    fs::write(dir.path().join("calc/calc.go"), CALC).unwrap();
    fs::write(dir.path().join("util/util.go"), UTIL).unwrap();
    dir
}

fn ingest(dir: &TempDir, jobs: usize) -> Ingested {
    let ingester = Ingester::new(
        IngestConfig {
            jobs,
            ..IngestConfig::default()
        },
        SourceResolver::new(Some("example.com/m".into()), dir.path()),
    )
    .unwrap();
    ingester.ingest(&parse_profiles(PROFILE).unwrap()).unwrap()
}

#[test]
fn attributes_counts_to_statements() {
    let dir = fixture();
    let ingested = ingest(&dir, 2);
    let names: Vec<&str> = ingested.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["example.com/m/calc", "example.com/m/util"]);

    let calc = &ingested.packages[0];
    let add = &calc.functions[0];
    assert_eq!(add.name, "Add");
    assert_eq!(add.statements[0].reached, 4);

    let abs = &calc.functions[1];
    let reached: Vec<i64> = abs.statements.iter().map(|s| s.reached).collect();
    assert_eq!(reached, vec![0, 2]);
    assert!(abs.file.ends_with("calc/calc.go"));
    assert_eq!(&CALC[abs.start..abs.end], "func Abs(a int) int {\n\tif a < 0 {\n\t\treturn -a\n\t}\n\treturn a\n}");

    let util = &ingested.packages[1];
    assert_eq!(util.functions[0].name, "Noop");
    assert!(util.functions[0].statements.is_empty());
}

#[test]
fn missing_sources_are_skipped_not_fatal() {
    let dir = fixture();
    let ingested = ingest(&dir, 1);
    assert_eq!(ingested.skipped.len(), 1);
    let (name, err) = &ingested.skipped[0];
    assert_eq!(name, "example.com/m/missing/gone.go");
    assert!(matches!(err, ProfileError::Io { .. }));
}

const INIT_A: &str = "package p

var x = func() int {
	return 1
}()

func init() {
	_ = x
}
";

const INIT_B: &str = "package p

var y = func() int {
	return 2
}()

func init() {
	_ = y
}
";

const INIT_PROFILE: &str = "mode: count
example.com/m/p/a.go:3.20,5.2 1 1
example.com/m/p/a.go:7.13,9.2 1 1
example.com/m/p/b.go:3.20,5.2 1 5
example.com/m/p/b.go:7.13,9.2 1 5
";

#[test]
fn same_named_functions_in_sibling_files_are_kept() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("p")).unwrap();
    fs::write(dir.path().join("p/a.go"), INIT_A).unwrap();
    fs::write(dir.path().join("p/b.go"), INIT_B).unwrap();

    let ingester = Ingester::new(
        IngestConfig::default(),
        SourceResolver::new(Some("example.com/m".into()), dir.path()),
    )
    .unwrap();
    let ingested = ingester.ingest(&parse_profiles(INIT_PROFILE).unwrap()).unwrap();
    assert!(ingested.skipped.is_empty());

    let functions = &ingested.packages[0].functions;
    let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["@3:9", "init", "@3:9", "init"]);
    let reached: Vec<i64> = functions.iter().map(|f| f.statements[0].reached).collect();
    assert_eq!(reached, vec![1, 1, 5, 5]);
    assert!(functions[2].file.ends_with("p/b.go"));
}

#[test]
fn worker_count_does_not_change_the_result() {
    let dir = fixture();
    assert_eq!(ingest(&dir, 1).packages, ingest(&dir, 4).packages);
}
