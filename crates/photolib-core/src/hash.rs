use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Read size for streaming hashes. Media files can be many gigabytes, so they
/// are never read into memory whole.
const CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB

/// SHA-256 of a file's bytes. The identity key across trees.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Last 8 bytes read as a big-endian u64, as 16 lowercase hex digits.
    /// Only good enough to tell two files with the same name apart.
    pub fn short(&self) -> String {
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[24..]);
        format!("{:016x}", u64::from_be_bytes(tail))
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Hash everything a reader yields, one chunk at a time.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(ContentDigest(hasher.finalize().into()))
}

/// Full content digest of the file at `path`.
pub fn full_digest(path: &Path) -> Result<ContentDigest> {
    let file = File::open(path)?;
    Ok(digest_reader(file)?)
}

/// Collision suffix for the file at `path`.
pub fn short_digest(path: &Path) -> Result<String> {
    Ok(full_digest(path)?.short())
}
