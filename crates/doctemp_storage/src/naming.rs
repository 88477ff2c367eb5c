//! Random name tokens for temp files and directories.
//!
//! A token is [`TOKEN_BYTES`] random bytes rendered as lower-case hex and
//! appended to a caller-supplied pattern, e.g. `img` becomes
//! `img3f9a01c27be4`.

use crate::error::StorageResult;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Number of random bytes drawn per token.
pub const TOKEN_BYTES: usize = 6;

/// Length of a hex-encoded token.
pub const TOKEN_LEN: usize = TOKEN_BYTES * 2;

/// Path separator inserted between a directory and a generated file name.
pub const SEPARATOR: char = '/';

/// Default number of names tried before giving up on a collision.
pub const DEFAULT_NAME_ATTEMPTS: u32 = 8;

/// Draws a hex token from `rng`.
///
/// # Errors
///
/// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
pub fn token_from<R: RngCore + ?Sized>(rng: &mut R) -> StorageResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Draws a fresh hex token from the thread-local generator.
///
/// # Errors
///
/// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
pub fn token() -> StorageResult<String> {
    token_from(&mut rand::thread_rng())
}

/// Returns `pattern` followed by a fresh token.
///
/// # Errors
///
/// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
pub fn temp_name(pattern: &str) -> StorageResult<String> {
    NameGenerator::default().temp_name(pattern)
}

/// Returns `dir/pattern<token>`.
///
/// # Errors
///
/// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
pub fn temp_path(dir: &str, pattern: &str) -> StorageResult<String> {
    NameGenerator::default().temp_path(dir, pattern)
}

fn join_name(pattern: &str, token: &str) -> String {
    let mut name = String::with_capacity(pattern.len() + token.len());
    name.push_str(pattern);
    name.push_str(token);
    name
}

/// The token source a storage draws temp names from.
///
/// The default draws from the thread-local generator. A seeded generator
/// yields the same name sequence every time, so two generators built from
/// the same seed agree on every name.
#[derive(Debug, Default)]
pub struct NameGenerator {
    seeded: Option<Mutex<StdRng>>,
}

impl NameGenerator {
    /// Creates a generator backed by the thread-local random source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a deterministic generator from `seed`.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Draws the next token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
    pub fn token(&self) -> StorageResult<String> {
        match &self.seeded {
            Some(rng) => token_from(&mut *rng.lock()),
            None => token(),
        }
    }

    /// Returns `pattern` followed by the next token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
    pub fn temp_name(&self, pattern: &str) -> StorageResult<String> {
        Ok(join_name(pattern, &self.token()?))
    }

    /// Returns `dir/pattern<token>` using the next token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NameGeneration`] if the random source fails.
    pub fn temp_path(&self, dir: &str, pattern: &str) -> StorageResult<String> {
        let name = self.temp_name(pattern)?;
        let mut path = String::with_capacity(dir.len() + 1 + name.len());
        path.push_str(dir);
        path.push(SEPARATOR);
        path.push_str(&name);
        Ok(path)
    }
}
