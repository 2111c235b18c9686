//! Artifact checksum calculation.
//!
//! SHA-256 over a file, streamed in fixed-size chunks so memory use does not
//! grow with the size of the disk image.

use crate::watcher::error::{ErrorExt, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Chunk size used when hashing release artifacts (1 MiB).
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Calculates the hex-encoded SHA-256 of a file.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    calculate_sha256_chunked(path, CHUNK_SIZE).await
}

/// Calculates the hex-encoded SHA-256 of a file, reading `chunk_size` bytes at a time.
///
/// The digest is independent of `chunk_size`.
pub async fn calculate_sha256_chunked(path: &Path, chunk_size: usize) -> Result<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
