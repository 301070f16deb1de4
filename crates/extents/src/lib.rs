//! # Gocov Extents
//!
//! Finds the functions and simple statements of Go source that coverage
//! tracks, as byte ranges with line/column positions.
//!
//! ## Architecture
//!
//! ```text
//! Go source
//!     │
//!     ├──> Tree-sitter Parsing → syntax tree (syntax errors are fatal)
//!     │
//!     └──> Walk
//!          ├─> Declarations with a body → FuncExtent (`F`, `T.M`)
//!          ├─> Literals outside functions → FuncExtent (`@line:col`)
//!          ├─> Simple statements → StmtExtent
//!          └─> `else if` → synthetic StmtExtent starting at `else`
//! ```
//!
//! Compound statements (`if`, `for`, `switch`, `select`, blocks) are never
//! registered themselves; the simple statements inside their bodies are.
//! Literals nested in a function contribute their statements to it.
//!
//! ## Example
//!
//! ```rust
//! use gocov_extents::ExtentDiscoverer;
//!
//! let src = "package p\n\nfunc (t *T) Run() {\n\tt.n++\n}\n";
//! let funcs = ExtentDiscoverer::default().discover(src).unwrap();
//! assert_eq!(funcs[0].name, "T.Run");
//! assert_eq!(funcs[0].stmts.len(), 1);
//! ```

mod config;
mod discoverer;
mod error;
mod language;
mod types;

pub use config::DiscoveryConfig;
pub use discoverer::{is_generated, ExtentDiscoverer};
pub use error::{ExtentError, Result};
pub use language::SourceLanguage;
pub use types::{Extent, FuncExtent, Position, StmtExtent, StmtKind};
