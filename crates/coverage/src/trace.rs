//! Rebuild coverage from a trace log.
//!
//! The log is replayed into a fresh [`Registry`]: every registration must be
//! assigned exactly the uid the producer recorded, otherwise the run is
//! rejected as a whole.

use crate::error::TraceError;
use crate::model::PackageCoverage;
use crate::registry::{Function, Object, ObjectKind, Package, Registry, Statement};
use gocov_protocol::{Event, EventReader, LocatedEvent, ObjectRef};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

type Result<T> = std::result::Result<T, TraceError>;

/// Replay a trace log and return its packages sorted by name.
///
/// Packages registered more than once under the same name are accumulated.
pub fn decode_trace(src: &str) -> Result<Vec<PackageCoverage>> {
    let replay = Replay::default();
    for event in EventReader::new(src) {
        replay.apply(event?)?;
    }
    replay.finish()
}

/// [`decode_trace`] over the contents of a file
pub fn decode_trace_file(path: &Path) -> Result<Vec<PackageCoverage>> {
    let src = std::fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("replaying trace {}", path.display());
    decode_trace(&src)
}

#[derive(Default)]
struct Replay {
    registry: Registry,
}

impl Replay {
    fn apply(&self, located: LocatedEvent) -> Result<()> {
        let line = located.line;
        match located.event {
            Event::RegisterPackage { name, target } => {
                let package = self.registry.register_package(name);
                check_identity(line, target, package.uid())
            }
            Event::RegisterFunction {
                package,
                name,
                file,
                start,
                end,
                target,
            } => {
                let package = self.package(line, package)?;
                let function = self
                    .registry
                    .register_function(&package, name, file, start, end);
                check_identity(line, target, function.uid())
            }
            Event::RegisterStatement {
                function,
                start,
                end,
                target,
            } => {
                let function = self.function(line, function)?;
                let statement = self.registry.register_statement(&function, start, end);
                check_identity(line, target, statement.uid())
            }
            Event::Enter(object) => {
                let function = self.function(line, object)?;
                self.registry.enter(&function);
                Ok(())
            }
            Event::Leave(object) => {
                let function = self.function(line, object)?;
                self.registry.leave(&function);
                Ok(())
            }
            Event::At(object) => {
                let statement = self.statement(line, object)?;
                self.registry.at(&statement);
                Ok(())
            }
        }
    }

    fn lookup(&self, line: usize, object: ObjectRef) -> Result<Object> {
        self.registry
            .get(object.uid())
            .ok_or(TraceError::UnknownObject { line, object })
    }

    fn package(&self, line: usize, object: ObjectRef) -> Result<Arc<Package>> {
        match self.lookup(line, object)? {
            Object::Package(p) => Ok(p),
            other => Err(wrong_kind(line, object, ObjectKind::Package, &other)),
        }
    }

    fn function(&self, line: usize, object: ObjectRef) -> Result<Arc<Function>> {
        match self.lookup(line, object)? {
            Object::Function(f) => Ok(f),
            other => Err(wrong_kind(line, object, ObjectKind::Function, &other)),
        }
    }

    fn statement(&self, line: usize, object: ObjectRef) -> Result<Arc<Statement>> {
        match self.lookup(line, object)? {
            Object::Statement(s) => Ok(s),
            other => Err(wrong_kind(line, object, ObjectKind::Statement, &other)),
        }
    }

    fn finish(self) -> Result<Vec<PackageCoverage>> {
        let mut by_name: BTreeMap<String, PackageCoverage> = BTreeMap::new();
        for package in self.registry.snapshot() {
            match by_name.get_mut(&package.name) {
                Some(existing) => existing.accumulate(&package).map_err(|source| TraceError::Merge {
                    package: package.name.clone(),
                    source,
                })?,
                None => {
                    by_name.insert(package.name.clone(), package);
                }
            }
        }
        Ok(by_name.into_values().collect())
    }
}

fn check_identity(line: usize, object: ObjectRef, actual: usize) -> Result<()> {
    if object.uid() == actual {
        Ok(())
    } else {
        Err(TraceError::IdentityViolation {
            line,
            object,
            actual,
        })
    }
}

fn wrong_kind(line: usize, object: ObjectRef, expected: ObjectKind, found: &Object) -> TraceError {
    TraceError::WrongKind {
        line,
        object,
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRACE: &str = r#"RegisterPackage("example.com/b"): gocovObject0
gocovObject0.RegisterFunction("F", "/src/b/f.go", 10, 90): gocovObject1
gocovObject1.RegisterStatement(20, 30): gocovObject2
gocovObject1.RegisterStatement(40, 50): gocovObject3
RegisterPackage("example.com/a"): gocovObject4
gocovObject1.Enter()
gocovObject2.At()
gocovObject1.Leave()
"#;

    #[test]
    fn replays_counts_and_sorts_packages() {
        let packages = decode_trace(TRACE).unwrap();
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["example.com/a", "example.com/b"]);

        let f = &packages[1].functions[0];
        assert_eq!((f.entered, f.left), (1, 1));
        let reached: Vec<i64> = f.statements.iter().map(|s| s.reached).collect();
        assert_eq!(reached, vec![1, 0]);
    }

    #[test]
    fn same_package_registered_twice_is_accumulated() {
        let src = r#"RegisterPackage("p"): gocovObject0
gocovObject0.RegisterFunction("F", "f.go", 0, 9): gocovObject1
RegisterPackage("p"): gocovObject2
gocovObject2.RegisterFunction("F", "f.go", 0, 9): gocovObject3
gocovObject1.Enter()
gocovObject3.Enter()
"#;
        let packages = decode_trace(src).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].functions[0].entered, 2);
    }

    #[test]
    fn same_name_different_shape_is_rejected() {
        let src = r#"RegisterPackage("p"): gocovObject0
gocovObject0.RegisterFunction("F", "f.go", 0, 9): gocovObject1
RegisterPackage("p"): gocovObject2
"#;
        let err = decode_trace(src).unwrap_err();
        assert!(matches!(err, TraceError::Merge { ref package, .. } if package == "p"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn drifted_uid_is_fatal() {
        let src = "RegisterPackage(\"p\"): gocovObject5\n";
        let err = decode_trace(src).unwrap_err();
        assert!(matches!(
            err,
            TraceError::IdentityViolation { line: 1, actual: 0, .. }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn unknown_object_is_reported() {
        let err = decode_trace("gocovObject7.At()\n").unwrap_err();
        assert!(matches!(err, TraceError::UnknownObject { line: 1, .. }));
    }

    #[test]
    fn visiting_a_package_is_a_kind_error() {
        let src = "RegisterPackage(\"p\"): gocovObject0\ngocovObject0.Enter()\n";
        let err = decode_trace(src).unwrap_err();
        assert!(matches!(
            err,
            TraceError::WrongKind {
                line: 2,
                expected: ObjectKind::Function,
                found: ObjectKind::Package,
                ..
            }
        ));
    }

    #[test]
    fn malformed_text_is_a_protocol_error() {
        let err = decode_trace("RegisterPackage(p): gocovObject0\n").unwrap_err();
        assert!(matches!(err, TraceError::Malformed(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = decode_trace_file(Path::new("/nonexistent/gocov/trace.log")).unwrap_err();
        assert!(matches!(err, TraceError::Io { .. }));
    }
}
