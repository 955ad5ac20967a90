//! Binary layout of the cache file.
//!
//! All integers are little-endian.
//!
//! ```text
//! magic        4 bytes   b"DSCH"
//! version      u32       FORMAT_VERSION
//! count        u64
//! count × entry:
//!   path_len   u32
//!   path       path_len bytes (raw OS bytes on Unix, UTF-8 elsewhere)
//!   size       u64
//!   mtime_secs i64       seconds relative to the UNIX epoch
//!   mtime_nsec u32       0..1_000_000_000, always added forward in time
//!   digest_len u32       must equal 16
//!   digest     digest_len bytes
//! checksum     32 bytes  SHA-256 of everything above
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest as _, Sha256};

use super::{CacheEntry, CacheError};
use crate::scanner::Digest;

/// File magic.
pub const MAGIC: &[u8; 4] = b"DSCH";

/// Current layout version. Any other version loads as an empty cache.
pub const FORMAT_VERSION: u32 = 1;

const CHECKSUM_LEN: usize = 32;
const HEADER_LEN: usize = 4 + 4 + 8;
// path_len + size + secs + nanos + digest_len + digest
const MIN_ENTRY_LEN: usize = 4 + 8 + 8 + 4 + 4 + 16;

/// Serialize entries into the cache layout.
#[must_use]
pub fn encode<'a, I>(entries: I) -> Vec<u8>
where
    I: ExactSizeIterator<Item = &'a CacheEntry>,
{
    let mut buf = Vec::with_capacity(HEADER_LEN + entries.len() * (MIN_ENTRY_LEN + 64));
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u64).to_le_bytes());

    for entry in entries {
        let path = path_to_bytes(&entry.path);
        buf.extend_from_slice(&(path.len() as u32).to_le_bytes());
        buf.extend_from_slice(&path);
        buf.extend_from_slice(&entry.size.to_le_bytes());
        let (secs, nanos) = time_to_parts(entry.modified);
        buf.extend_from_slice(&secs.to_le_bytes());
        buf.extend_from_slice(&nanos.to_le_bytes());
        buf.extend_from_slice(&(entry.digest.len() as u32).to_le_bytes());
        buf.extend_from_slice(&entry.digest);
    }

    let checksum = Sha256::digest(&buf);
    buf.extend_from_slice(&checksum);
    buf
}

/// Parse the cache layout.
///
/// # Errors
///
/// Any truncation, trailing bytes, bad magic, checksum mismatch or field out
/// of range is [`CacheError::Corrupt`]; an unknown version is
/// [`CacheError::UnsupportedVersion`].
pub fn decode(bytes: &[u8]) -> Result<Vec<CacheEntry>, CacheError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(CacheError::Corrupt(format!(
            "file too short ({} bytes)",
            bytes.len()
        )));
    }

    let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let mut reader = Reader::new(body);

    if reader.take(4)? != MAGIC {
        return Err(CacheError::Corrupt("bad magic".to_string()));
    }
    let version = reader.u32()?;
    if version != FORMAT_VERSION {
        return Err(CacheError::UnsupportedVersion(version));
    }
    if Sha256::digest(body).as_slice() != checksum {
        return Err(CacheError::Corrupt("checksum mismatch".to_string()));
    }

    let count = reader.u64()?;
    let max_plausible = (reader.remaining() / MIN_ENTRY_LEN) as u64;
    if count > max_plausible {
        return Err(CacheError::Corrupt(format!(
            "entry count {} exceeds file size",
            count
        )));
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let path_len = reader.u32()? as usize;
        let path = bytes_to_path(reader.take(path_len)?)?;
        let size = reader.u64()?;
        let secs = reader.i64()?;
        let nanos = reader.u32()?;
        let modified = parts_to_time(secs, nanos)?;
        let digest_len = reader.u32()? as usize;
        let digest: Digest = reader
            .take(digest_len)?
            .try_into()
            .map_err(|_| CacheError::Corrupt(format!("digest length {}", digest_len)))?;

        entries.push(CacheEntry {
            path,
            size,
            modified,
            digest,
        });
    }

    if reader.remaining() != 0 {
        return Err(CacheError::Corrupt(format!(
            "{} trailing bytes",
            reader.remaining()
        )));
    }
    Ok(entries)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CacheError> {
        if n > self.remaining() {
            return Err(CacheError::Corrupt(format!(
                "truncated at offset {} (wanted {} bytes)",
                self.pos, n
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CacheError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, CacheError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, CacheError> {
        self.array().map(u64::from_le_bytes)
    }

    fn i64(&mut self) -> Result<i64, CacheError> {
        self.array().map(i64::from_le_bytes)
    }
}

/// Split a timestamp into whole seconds (possibly negative) and forward nanos.
fn time_to_parts(t: SystemTime) -> (i64, u32) {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => (i64::try_from(d.as_secs()).unwrap_or(i64::MAX), d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            if d.subsec_nanos() == 0 {
                (-secs, 0)
            } else {
                (-secs - 1, 1_000_000_000 - d.subsec_nanos())
            }
        }
    }
}

fn parts_to_time(secs: i64, nanos: u32) -> Result<SystemTime, CacheError> {
    if nanos >= 1_000_000_000 {
        return Err(CacheError::Corrupt(format!("nanoseconds out of range: {}", nanos)));
    }
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(Duration::from_secs(secs.unsigned_abs()))
    } else {
        UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))
    };
    base.and_then(|t| t.checked_add(Duration::from_nanos(u64::from(nanos))))
        .ok_or_else(|| CacheError::Corrupt(format!("timestamp out of range: {}s", secs)))
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> Result<PathBuf, CacheError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> Result<PathBuf, CacheError> {
    String::from_utf8(bytes.to_vec())
        .map(PathBuf::from)
        .map_err(|_| CacheError::Corrupt("path is not valid UTF-8".to_string()))
}
