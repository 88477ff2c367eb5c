//! # Doctemp Testkit
//!
//! Test utilities for doctemp storage.
//!
//! This crate provides:
//! - Test fixtures for both backends
//! - Property-based test generators using proptest
//! - A staging harness that tracks expected file content
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doctemp_testkit::prelude::*;
//!
//! #[test]
//! fn stages_on_every_backend() {
//!     for_each_backend(|storage, dir| {
//!         let name = storage.write_temp(dir, "img", b"bytes").unwrap();
//!         assert_eq!(storage.read_to_vec(&name).unwrap(), b"bytes");
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
