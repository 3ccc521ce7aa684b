// src/report/digest.rs

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use tracing::debug;

use crate::errors::{DeptraceError, Result};
use crate::fs::FileSystem;

/// 128-bit MD5 digest of a file's content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 16]);

impl ContentDigest {
    /// All-zero digest recorded for a tracked file that was gone by report
    /// time, so whatever later appears at that path reads as changed.
    pub const VANISHED: Self = Self([0u8; 16]);

    /// Digest of an in-memory buffer.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Md5::new();
        hasher.update(data);
        Self::from_hasher(hasher)
    }

    /// 32 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse exactly 32 hex digits (either case).
    pub fn from_hex(text: &str) -> std::result::Result<Self, String> {
        if text.len() != 32 {
            return Err(format!(
                "expected 32 hex digits, got {} characters",
                text.len()
            ));
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(text, &mut bytes).map_err(|e| e.to_string())?;
        Ok(Self(bytes))
    }

    fn from_hasher(hasher: Md5) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash the full content of `path`.
///
/// Returns `Ok(None)` when the file cannot be read for lack of permission;
/// such files are skipped rather than failing the whole report. Any other
/// failure to read the file completely is an error; a missing file can be
/// told apart with [`DeptraceError::is_not_found`].
pub fn hash_file(fs: &dyn FileSystem, path: &Path) -> Result<Option<ContentDigest>> {
    let mut reader = match fs.open_read(path) {
        Ok(reader) => reader,
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            debug!(?path, "permission denied; no digest");
            return Ok(None);
        }
        Err(err) => return Err(DeptraceError::io("opening file for hashing", path)(err)),
    };

    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                debug!(?path, "permission denied while reading; no digest");
                return Ok(None);
            }
            Err(err) => return Err(DeptraceError::io("reading file for hashing", path)(err)),
        };
        hasher.update(&buf[..n]);
    }

    Ok(Some(ContentDigest::from_hasher(hasher)))
}
