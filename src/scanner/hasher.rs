//! MD5 file hasher with streaming support.
//!
//! # Overview
//! This module provides the [`Hasher`] struct for computing content digests
//! of files by streaming them through MD5 in fixed-size chunks.
//!
//! MD5 is used only as an equality proxy for accidental duplicates. It is not
//! collision-resistant against crafted input and must not be treated as a
//! security boundary.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use md5::{Digest as _, Md5};

use super::HashError;

/// Size of each read fed into the digest accumulator.
pub const CHUNK_SIZE: usize = 4096;

/// A 128-bit content digest.
pub type Digest = [u8; 16];

/// Streaming content hasher.
///
/// Stateless: a single instance can be shared across worker threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the digest of the file at `path`.
    ///
    /// The file is read as an opaque byte stream in [`CHUNK_SIZE`] chunks.
    /// An empty file yields the digest of zero bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] if the file cannot be opened or a read fails
    /// mid-stream. Failed reads are not retried.
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut ctx = Md5::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                // EINTR, not a real failure
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            ctx.update(&buffer[..n]);
        }

        Ok(ctx.finalize().into())
    }

    /// Compute the digest of an in-memory buffer.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> Digest {
        Md5::digest(data).into()
    }
}

/// Render a digest as 32 lowercase hex characters.
#[must_use]
pub fn digest_to_hex(digest: &Digest) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse a 32-character hex string back into a digest.
#[must_use]
pub fn hex_to_digest(hex: &str) -> Option<Digest> {
    if hex.len() != 32 || !hex.is_ascii() {
        return None;
    }
    let mut digest = [0u8; 16];
    for (i, byte) in digest.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(digest)
}
