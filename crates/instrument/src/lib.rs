//! # Gocov Instrument
//!
//! Rewrites Go source so that, when run, it registers its functions and
//! statements with the gocov registry and reports every visit.
//!
//! For a file of package `example.com/p`:
//!
//! ```text
//! func F() {                func F() { gocovObject1.Enter(); defer gocovObject1.Leave();
//!     x()          ──>          gocovObject2.At(); x()
//! }                         }
//! ```
//!
//! with `var gocovObjectN = ...Register...(...)` declarations placed after
//! the imports. All changes are collected as edits against the original
//! text and applied in one pass.
//!
//! ## Example
//!
//! ```rust
//! use gocov_instrument::{InstrumentConfig, Instrumenter};
//!
//! let mut instrumenter = Instrumenter::new(InstrumentConfig::default()).unwrap();
//! let out = instrumenter
//!     .instrument_file("example.com/p", "p.go", "package p\n\nfunc F() {\n\tx()\n}\n")
//!     .unwrap();
//! assert!(out.source.contains("gocovObject2.At(); x()"));
//! ```

mod config;
mod edit;
mod error;
mod imports;
mod instrumenter;

pub use config::{InstrumentConfig, DEFAULT_REGISTRY_IMPORT};
pub use edit::{apply_edits, Edit};
pub use error::{InstrumentError, Result};
pub use imports::{instrumentable, instrumented_package_path};
pub use instrumenter::{InstrumentedFile, Instrumenter};
