//! Content key generation.

use hoard_core::{ContentKey, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Hash a byte stream into a content key.
///
/// The stream is consumed in fixed-size chunks, so memory use does not
/// depend on input size. A read error aborts without producing a key.
pub async fn fingerprint_reader<R>(mut reader: R) -> Result<ContentKey>
where
    R: AsyncRead + Unpin,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentKey::from_digest(&hasher.finalize()))
}

/// Hash the contents of a file on disk.
pub async fn fingerprint_file(path: &Path) -> Result<ContentKey> {
    let file = tokio::fs::File::open(path).await?;
    fingerprint_reader(file).await
}

/// Hash an in-memory buffer.
pub fn fingerprint_bytes(data: &[u8]) -> ContentKey {
    ContentKey::from_digest(&Sha256::digest(data))
}
