//! # Doctemp Storage
//!
//! Temporary storage for document generation.
//!
//! While a document is assembled, embedded images and intermediate archive
//! entries are staged as temp files before the final package is written.
//! This crate provides the storage those files live in, behind one trait so
//! the assembler behaves the same whichever backend is selected.
//!
//! ## Design Principles
//!
//! - One backend per process, chosen once through [`StorageConfig`]
//! - Handles are plain [`std::io::Read`] + [`std::io::Write`] streams
//! - Writes always append; reads advance a per-handle cursor
//! - Backends must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`MemoryStorage`] - Everything resident in memory
//! - [`DiskStorage`] - Pass-through to the host filesystem
//!
//! ## Example
//!
//! ```rust
//! use doctemp_storage::StorageConfig;
//!
//! let storage = StorageConfig::memory().build();
//! let name = storage.write_temp("word/media", "image", b"\x89PNG").unwrap();
//! assert_eq!(storage.read_to_vec(&name).unwrap(), b"\x89PNG");
//!
//! // Clears everything, whatever directory is passed.
//! storage.remove_all("word/media").unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod disk;
mod error;
mod memory;
pub mod naming;

pub use backend::{TempFile, TempStorage};
pub use config::{BackendKind, StorageConfig};
pub use disk::{DiskFile, DiskStorage};
pub use error::{StorageError, StorageResult};
pub use memory::{MemFile, MemoryStorage};
