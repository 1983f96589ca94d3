//! Streaming SHA-256 over the image's digest domain (§4.2, §6.5).

use sha2::{Digest, Sha256};
use storage::fs::File;

use crate::error::ImageError;
use crate::header::ImageHeader;

/// Upper bound on the stack buffer digest reads stream through. The actual
/// number of bytes read per iteration is `chunk_size` (§6.4's `CHUNK_SIZE`
/// config value), clamped to this; the buffer itself stays a fixed-size
/// stack array regardless, so a configurable chunk size never requires
/// dynamic allocation (§9).
pub const MAX_CHUNK_SIZE: usize = 256;

/// Hashes `header.digest_len()` bytes starting at offset 0: header, payload,
/// and protected TLV block, in that order, exactly as they sit on disk.
pub fn compute_digest<F: File>(
    file: &mut F,
    header: &ImageHeader,
    chunk_size: usize,
) -> Result<[u8; 32], ImageError<F::Error>> {
    file.seek(0).map_err(|cause| ImageError::Io { cause })?;

    let chunk_size = chunk_size.min(MAX_CHUNK_SIZE);
    let mut hasher = Sha256::new();
    let mut remaining = header.digest_len();
    let mut chunk = [0u8; MAX_CHUNK_SIZE];

    while remaining > 0 {
        let want = remaining.min(chunk_size as u64) as usize;
        let n = file
            .read(&mut chunk[..want])
            .map_err(|cause| ImageError::Io { cause })?;
        if n == 0 {
            return Err(ImageError::ShortRead);
        }
        hasher.update(&chunk[..n]);
        remaining -= n as u64;
    }

    Ok(hasher.finalize().into())
}
