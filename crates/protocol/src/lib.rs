//! # Gocov Protocol
//!
//! The trace log an instrumented program writes while it runs. Every line is
//! one event:
//!
//! ```text
//! RegisterPackage("example.com/p"): gocovObject0
//! gocovObject0.RegisterFunction("F", "/src/p/f.go", 10, 52): gocovObject1
//! gocovObject1.RegisterStatement(24, 30): gocovObject2
//! gocovObject1.Enter()
//! gocovObject2.At()
//! gocovObject1.Leave()
//! ```
//!
//! This crate only knows the grammar: it encodes [`Event`]s to text and reads
//! text back into events. Replaying events against a registry lives in
//! `gocov-coverage`.
//!
//! ## Example
//!
//! ```rust
//! use gocov_protocol::{parse_events, Event, ObjectRef};
//!
//! let line = Event::RegisterPackage {
//!     name: "example.com/p".to_string(),
//!     target: ObjectRef::new(0),
//! }
//! .encode();
//! assert_eq!(line, "RegisterPackage(\"example.com/p\"): gocovObject0\n");
//!
//! let events = parse_events(&line).unwrap();
//! assert_eq!(events.len(), 1);
//! ```

mod error;
mod event;
mod lexer;
mod object_ref;
mod quote;
mod reader;

pub use error::{ProtocolError, Result};
pub use event::Event;
pub use object_ref::{ObjectRef, OBJECT_PREFIX};
pub use quote::{quote, unquote};
pub use reader::{parse_events, EventReader, LocatedEvent};
