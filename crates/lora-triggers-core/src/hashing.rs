//! Streaming content hashes used to identify a LoRA on the remote registry.
//!
//! Two SHA256 variants are computed, both streamed in fixed-size chunks:
//! - AutoV3: digest of the tensor body, skipping the safetensors JSON header
//! - AutoV2: digest of the whole file

use crate::config::HashingConfig;
use crate::error::{Result, TriggerError};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Which part of the file a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashVariant {
    /// SHA256 of everything after the `8 + header_size` byte prefix.
    AutoV3,
    /// SHA256 of the entire file.
    AutoV2,
}

impl HashVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashVariant::AutoV3 => "AutoV3",
            HashVariant::AutoV2 => "AutoV2",
        }
    }
}

impl fmt::Display for HashVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uppercase hex SHA256 tagged with its variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HashDigest {
    pub variant: HashVariant,
    pub hex: String,
}

impl HashDigest {
    fn from_hasher(variant: HashVariant, hasher: Sha256) -> Self {
        Self {
            variant,
            hex: hex::encode_upper(hasher.finalize()),
        }
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variant, self.hex)
    }
}

/// Compute the requested digest variant.
pub fn compute_hash(path: impl AsRef<Path>, variant: HashVariant) -> Result<HashDigest> {
    match variant {
        HashVariant::AutoV3 => compute_body_hash(path),
        HashVariant::AutoV2 => compute_full_hash(path),
    }
}

/// Compute the AutoV3 body hash.
///
/// The first 8 bytes are read as a little-endian `u64` header length; hashing
/// starts at offset `8 + header_len`. A file shorter than the prefix is an
/// [`TriggerError::InvalidHeader`].
pub fn compute_body_hash(path: impl AsRef<Path>) -> Result<HashDigest> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| TriggerError::io_with_path(e, path))?;

    let mut size_buf = [0u8; HashingConfig::HEADER_PREFIX_LEN as usize];
    file.read_exact(&mut size_buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TriggerError::InvalidHeader {
                path: path.to_path_buf(),
                message: "file shorter than the 8-byte header prefix".to_string(),
            }
        } else {
            TriggerError::io_with_path(e, path)
        }
    })?;
    let header_size = u64::from_le_bytes(size_buf);

    let body_start = HashingConfig::HEADER_PREFIX_LEN
        .checked_add(header_size)
        .ok_or_else(|| TriggerError::InvalidHeader {
            path: path.to_path_buf(),
            message: format!("header size {} overflows", header_size),
        })?;
    file.seek(SeekFrom::Start(body_start))
        .map_err(|e| TriggerError::io_with_path(e, path))?;

    let mut hasher = Sha256::new();
    stream_into(&mut file, &mut hasher, path)?;
    Ok(HashDigest::from_hasher(HashVariant::AutoV3, hasher))
}

/// Compute the AutoV2 full-file hash.
pub fn compute_full_hash(path: impl AsRef<Path>) -> Result<HashDigest> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|e| TriggerError::io_with_path(e, path))?;

    let mut hasher = Sha256::new();
    stream_into(&mut file, &mut hasher, path)?;
    Ok(HashDigest::from_hasher(HashVariant::AutoV2, hasher))
}

fn stream_into<R: Read>(reader: &mut R, hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut buffer = vec![0u8; HashingConfig::CHUNK_SIZE];
    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| TriggerError::io_with_path(e, path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(())
}
