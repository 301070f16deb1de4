//! Live coverage objects and the registry that allocates them.
//!
//! Registration is serialized by one lock over the object table. Counting is
//! a single atomic add; the first visit of an object (or every visit in
//! [`TraceMode::All`]) additionally writes a precomputed line to the trace
//! sink.

use crate::model::{FunctionCoverage, PackageCoverage, StatementCoverage};
use crate::sink::TraceSink;
use gocov_protocol::{Event, ObjectRef};
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which visits are written to the trace sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceMode {
    /// Only the first visit of each object
    #[default]
    FirstVisit,

    /// Every visit (may slow the traced program down considerably)
    All,
}

/// Kind of a registered object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Package,
    Function,
    Statement,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Package => "package",
            Self::Function => "function",
            Self::Statement => "statement",
        })
    }
}

/// Any registered object
#[derive(Debug, Clone)]
pub enum Object {
    Package(Arc<Package>),
    Function(Arc<Function>),
    Statement(Arc<Statement>),
}

impl Object {
    #[must_use]
    pub fn uid(&self) -> usize {
        match self {
            Self::Package(p) => p.uid,
            Self::Function(f) => f.uid,
            Self::Statement(s) => s.uid,
        }
    }

    #[must_use]
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.uid())
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Package(_) => ObjectKind::Package,
            Self::Function(_) => ObjectKind::Function,
            Self::Statement(_) => ObjectKind::Statement,
        }
    }
}

/// A package registered for coverage
#[derive(Debug)]
pub struct Package {
    uid: usize,
    name: String,
    functions: Mutex<Vec<Arc<Function>>>,
}

impl Package {
    #[must_use]
    pub const fn uid(&self) -> usize {
        self.uid
    }

    #[must_use]
    pub const fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.uid)
    }

    /// Canonical import path
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn functions(&self) -> Vec<Arc<Function>> {
        lock(&self.functions).clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> PackageCoverage {
        PackageCoverage {
            name: self.name.clone(),
            functions: lock(&self.functions).iter().map(|f| f.snapshot()).collect(),
        }
    }
}

/// A function registered for coverage
#[derive(Debug)]
pub struct Function {
    uid: usize,
    name: String,
    file: String,
    start: usize,
    end: usize,
    statements: Mutex<Vec<Arc<Statement>>>,
    entered: AtomicI64,
    left: AtomicI64,
    enter_line: Box<[u8]>,
    leave_line: Box<[u8]>,
}

impl Function {
    #[must_use]
    pub const fn uid(&self) -> usize {
        self.uid
    }

    #[must_use]
    pub const fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.uid)
    }

    /// `T.Method` for methods, `@line:col` for top-level literals
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn statements(&self) -> Vec<Arc<Statement>> {
        lock(&self.statements).clone()
    }

    #[must_use]
    pub fn entered(&self) -> i64 {
        self.entered.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn left(&self) -> i64 {
        self.left.load(Ordering::Relaxed)
    }

    /// Add entries and exits observed outside this process.
    pub fn record(&self, entered: i64, left: i64) {
        self.entered.fetch_add(entered, Ordering::Relaxed);
        self.left.fetch_add(left, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> FunctionCoverage {
        FunctionCoverage {
            name: self.name.clone(),
            file: self.file.clone(),
            start: self.start,
            end: self.end,
            statements: lock(&self.statements).iter().map(|s| s.snapshot()).collect(),
            entered: self.entered(),
            left: self.left(),
        }
    }
}

/// A statement registered for coverage
#[derive(Debug)]
pub struct Statement {
    uid: usize,
    start: usize,
    end: usize,
    reached: AtomicI64,
    at_line: Box<[u8]>,
}

impl Statement {
    #[must_use]
    pub const fn uid(&self) -> usize {
        self.uid
    }

    #[must_use]
    pub const fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.uid)
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn reached(&self) -> i64 {
        self.reached.load(Ordering::Relaxed)
    }

    /// Add hits observed outside this process (profile ingestion).
    ///
    /// Never traced: the count did not come from this run.
    pub fn record(&self, count: i64) {
        self.reached.fetch_add(count, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatementCoverage {
        StatementCoverage {
            start: self.start,
            end: self.end,
            reached: self.reached(),
        }
    }
}

struct Tracer {
    sink: Mutex<Box<dyn Write + Send>>,
    mode: TraceMode,
    failed: AtomicBool,
}

impl Tracer {
    fn write(&self, bytes: &[u8]) {
        let result = lock(&self.sink).write_all(bytes);
        if let Err(err) = result {
            if !self.failed.swap(true, Ordering::Relaxed) {
                log::warn!("gocov: failed to write trace: {err}");
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.sink).flush()
    }
}

/// Allocates coverage objects and counts visits.
///
/// A registry is an explicit value: create one at process start and pass it
/// to whatever needs it.
pub struct Registry {
    objects: Mutex<Vec<Object>>,
    tracer: Option<Tracer>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("objects", &lock(&self.objects).len())
            .field("tracing", &self.tracer.as_ref().map(|t| t.mode))
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry that does not trace
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            tracer: None,
        }
    }

    /// Registry that writes protocol events to `sink`
    #[must_use]
    pub fn with_sink(sink: impl Write + Send + 'static, mode: TraceMode) -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            tracer: Some(Tracer {
                sink: Mutex::new(Box::new(sink)),
                mode,
                failed: AtomicBool::new(false),
            }),
        }
    }

    /// Registry tracing to the configured sink, or not tracing when disabled
    pub fn with_sink_config(config: &TraceSink, mode: TraceMode) -> io::Result<Self> {
        Ok(match config.open()? {
            Some(sink) => Self::with_sink(sink, mode),
            None => Self::new(),
        })
    }

    /// Registry configured from `GOCOVOUT`
    pub fn from_env(mode: TraceMode) -> io::Result<Self> {
        Self::with_sink_config(&TraceSink::from_env(), mode)
    }

    #[must_use]
    pub fn is_tracing(&self) -> bool {
        self.tracer.is_some()
    }

    /// Number of registered objects; also the next uid
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn get(&self, uid: usize) -> Option<Object> {
        lock(&self.objects).get(uid).cloned()
    }

    /// All objects in uid order
    #[must_use]
    pub fn objects(&self) -> Vec<Object> {
        lock(&self.objects).clone()
    }

    /// Registered packages in registration order
    #[must_use]
    pub fn packages(&self) -> Vec<Arc<Package>> {
        lock(&self.objects)
            .iter()
            .filter_map(|object| match object {
                Object::Package(p) => Some(Arc::clone(p)),
                _ => None,
            })
            .collect()
    }

    /// Plain copy of every package with current counters
    #[must_use]
    pub fn snapshot(&self) -> Vec<PackageCoverage> {
        self.packages().iter().map(|p| p.snapshot()).collect()
    }

    // Events are written while the table lock is held so that the log
    // order always equals uid order.
    fn emit(&self, event: &Event) {
        if let Some(tracer) = &self.tracer {
            tracer.write(event.encode().as_bytes());
        }
    }

    pub fn register_package(&self, name: impl Into<String>) -> Arc<Package> {
        let mut objects = lock(&self.objects);
        let package = Arc::new(Package {
            uid: objects.len(),
            name: name.into(),
            functions: Mutex::new(Vec::new()),
        });
        objects.push(Object::Package(Arc::clone(&package)));
        self.emit(&Event::RegisterPackage {
            name: package.name.clone(),
            target: package.object_ref(),
        });
        package
    }

    pub fn register_function(
        &self,
        package: &Package,
        name: impl Into<String>,
        file: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Arc<Function> {
        let mut objects = lock(&self.objects);
        let target = ObjectRef::new(objects.len());
        let function = Arc::new(Function {
            uid: target.uid(),
            name: name.into(),
            file: file.into(),
            start,
            end,
            statements: Mutex::new(Vec::new()),
            entered: AtomicI64::new(0),
            left: AtomicI64::new(0),
            enter_line: target.call_line("Enter"),
            leave_line: target.call_line("Leave"),
        });
        lock(&package.functions).push(Arc::clone(&function));
        objects.push(Object::Function(Arc::clone(&function)));
        self.emit(&Event::RegisterFunction {
            package: package.object_ref(),
            name: function.name.clone(),
            file: function.file.clone(),
            start,
            end,
            target,
        });
        function
    }

    pub fn register_statement(&self, function: &Function, start: usize, end: usize) -> Arc<Statement> {
        let mut objects = lock(&self.objects);
        let target = ObjectRef::new(objects.len());
        let statement = Arc::new(Statement {
            uid: target.uid(),
            start,
            end,
            reached: AtomicI64::new(0),
            at_line: target.call_line("At"),
        });
        lock(&function.statements).push(Arc::clone(&statement));
        objects.push(Object::Statement(Arc::clone(&statement)));
        self.emit(&Event::RegisterStatement {
            function: function.object_ref(),
            start,
            end,
            target,
        });
        statement
    }

    fn trace_visit(&self, count: i64, line: &[u8]) {
        if let Some(tracer) = &self.tracer {
            if count == 1 || tracer.mode == TraceMode::All {
                tracer.write(line);
            }
        }
    }

    /// The function has been entered.
    pub fn enter(&self, function: &Function) {
        let count = function.entered.fetch_add(1, Ordering::Relaxed) + 1;
        self.trace_visit(count, &function.enter_line);
    }

    /// The function has been left.
    pub fn leave(&self, function: &Function) {
        let count = function.left.fetch_add(1, Ordering::Relaxed) + 1;
        self.trace_visit(count, &function.leave_line);
    }

    /// The statement has been reached.
    pub fn at(&self, statement: &Statement) {
        let count = statement.reached.fetch_add(1, Ordering::Relaxed) + 1;
        self.trace_visit(count, &statement.at_line);
    }

    /// Flush the trace sink, if any.
    pub fn flush(&self) -> io::Result<()> {
        self.tracer.as_ref().map_or(Ok(()), Tracer::flush)
    }
}
