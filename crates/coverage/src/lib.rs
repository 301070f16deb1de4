//! # Gocov Coverage
//!
//! The coverage object model and everything that mutates it.
//!
//! ## Architecture
//!
//! ```text
//! instrumented program                 collector
//!     │                                    │
//!     ├──> Registry (live objects)         ├──> trace::decode_trace
//!     │      ├─ uid allocation             │      └─ replays events into a fresh Registry
//!     │      ├─ atomic counters            │
//!     │      └─ trace sink ── events ──────┘
//!     │
//!     └──> Registry::snapshot()
//!            └─ PackageCoverage / FunctionCoverage / StatementCoverage
//!                   │
//!                   └──> Report (sorted by package, accumulate on merge)
//! ```
//!
//! Live objects (`registry::{Package, Function, Statement}`) are shared and
//! counted concurrently. Snapshots are plain values: they are what gets
//! merged, serialized and summarized.
//!
//! ## Example
//!
//! ```rust
//! use gocov_coverage::{Registry, Report};
//!
//! let registry = Registry::new();
//! let pkg = registry.register_package("example.com/p");
//! let f = registry.register_function(&pkg, "F", "f.go", 0, 40);
//! let s = registry.register_statement(&f, 12, 20);
//! registry.enter(&f);
//! registry.at(&s);
//! registry.leave(&f);
//!
//! let mut report = Report::new();
//! for package in registry.snapshot() {
//!     report.merge_package(package).unwrap();
//! }
//! assert_eq!(report.packages()[0].functions[0].statements[0].reached, 1);
//! ```

mod error;
mod model;
pub mod registry;
mod report;
mod sink;
pub mod summary;
pub mod trace;

pub use error::{MergeError, ReportError, TraceError};
pub use model::{FunctionCoverage, PackageCoverage, SourceRange, StatementCoverage};
pub use registry::{Object, ObjectKind, Registry, TraceMode};
pub use report::Report;
pub use sink::{TraceSink, TRACE_OUTPUT_ENV};
