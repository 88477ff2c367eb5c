//! Property-based test generators using proptest.
//!
//! Provides strategies for generating temp file content, name patterns and
//! handle operation sequences.

use doctemp_storage::TempFile;
use proptest::prelude::*;
use std::io::{Read, Write};

/// Strategy for generating file content (arbitrary bytes).
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

/// Strategy for generating content split into write-sized chunks.
pub fn chunked_content_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 0..16)
}

/// Strategy for generating temp name patterns.
pub fn pattern_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,15}").expect("Invalid regex")
}

/// A single operation on an open handle.
#[derive(Debug, Clone)]
pub enum HandleOperation {
    /// Append bytes.
    Write {
        /// Bytes to append.
        data: Vec<u8>,
    },
    /// Read into a buffer of the given size.
    Read {
        /// Buffer size.
        len: usize,
    },
}

/// Strategy for a single handle operation.
pub fn handle_operation_strategy() -> impl Strategy<Value = HandleOperation> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..64).prop_map(|data| HandleOperation::Write { data }),
        (0usize..96).prop_map(|len| HandleOperation::Read { len }),
    ]
}

/// Strategy for a sequence of handle operations.
pub fn handle_operations_strategy(max_len: usize) -> impl Strategy<Value = Vec<HandleOperation>> {
    prop::collection::vec(handle_operation_strategy(), 0..max_len)
}

/// The model a handle is expected to follow: append-only content plus an
/// independent read cursor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HandleModel {
    /// Everything written so far.
    pub content: Vec<u8>,
    /// Bytes consumed by reads.
    pub offset: usize,
}

impl HandleModel {
    /// Applies one operation, returning the bytes a read should produce.
    pub fn apply(&mut self, op: &HandleOperation) -> Vec<u8> {
        match op {
            HandleOperation::Write { data } => {
                self.content.extend_from_slice(data);
                Vec::new()
            }
            HandleOperation::Read { len } => {
                let end = self.content.len().min(self.offset + len);
                let out = self.content[self.offset..end].to_vec();
                self.offset = end;
                out
            }
        }
    }
}

/// Runs `ops` against `file` and the model side by side.
///
/// Returns the first operation index where the file disagreed with the model.
pub fn check_against_model(
    file: &mut dyn TempFile,
    ops: &[HandleOperation],
) -> Result<HandleModel, usize> {
    let mut model = HandleModel::default();

    for (i, op) in ops.iter().enumerate() {
        let expected = model.apply(op);
        match op {
            HandleOperation::Write { data } => {
                if file.write(data).map_err(|_| i)? != data.len() {
                    return Err(i);
                }
            }
            HandleOperation::Read { len } => {
                let mut buf = vec![0u8; *len];
                let n = file.read(&mut buf).map_err(|_| i)?;
                if buf[..n] != expected[..] {
                    return Err(i);
                }
            }
        }
    }

    Ok(model)
}
