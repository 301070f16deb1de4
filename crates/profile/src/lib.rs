//! # Gocov Profile
//!
//! Converts Go cover profiles into gocov coverage. Each profiled file is
//! re-read and its statements discovered; every statement then takes the
//! count of the first profile block overlapping it.
//!
//! ## Example
//!
//! ```rust
//! use gocov_profile::parse_profiles;
//!
//! let profiles = parse_profiles("mode: set\nexample.com/m/p/f.go:3.14,5.2 2 1\n").unwrap();
//! assert_eq!(profiles[0].package(), "example.com/m/p");
//! ```

mod attribute;
mod error;
mod ingest;
mod parse;

pub use attribute::attribute;
pub use error::{ProfileError, Result};
pub use ingest::{IngestConfig, Ingested, Ingester, SourceResolver};
pub use parse::{parse_profiles, parse_profiles_file, Mode, Profile, ProfileBlock};
