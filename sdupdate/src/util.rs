//! Small helpers shared by the header, TLV, and digest readers.

use storage::fs::File;

use crate::error::ImageError;

/// Reads `buf.len()` bytes from `file`, looping over short reads (a single
/// `read` call is not guaranteed to fill the buffer even away from EOF).
/// Fails with [`ImageError::ShortRead`] the moment `read` reports zero bytes
/// before the buffer is full — i.e. a genuine end-of-stream (I1).
pub fn read_exact<F: File>(file: &mut F, buf: &mut [u8]) -> Result<(), ImageError<F::Error>> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file
            .read(&mut buf[filled..])
            .map_err(|cause| ImageError::Io { cause })?;
        if n == 0 {
            return Err(ImageError::ShortRead);
        }
        filled += n;
    }
    Ok(())
}
