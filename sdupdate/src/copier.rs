//! Slot copier (§4.4): moves bytes between the SD-backed candidate stream
//! and the on-chip flash slot through a fixed stack buffer. No heap
//! allocation, generic over both collaborators so host tests and firmware
//! share one implementation.

use storage::fs::File as FsFile;
use storage::Flash;

use crate::error::CopyError;

/// Upper bound on the stack buffer flash<->file copies stream through.
/// Mirrors [`crate::digest::MAX_CHUNK_SIZE`]; kept as its own constant since
/// the two hot paths are conceptually unrelated even though they share a
/// value. The configured `chunk_size` (§6.4) is clamped to this so the
/// buffer itself never needs to grow at runtime.
pub const MAX_CHUNK_SIZE: usize = 256;

/// Copies `len` bytes from the primary flash slot into `dest`, starting at
/// `slot_offset`. Used to capture a backup before writing the candidate.
pub fn backup<FL: Flash, D: FsFile>(
    flash: &mut FL,
    slot_offset: usize,
    len: usize,
    dest: &mut D,
    chunk_size: usize,
) -> Result<(), CopyError<D::Error>> {
    let chunk_size = chunk_size.min(MAX_CHUNK_SIZE);
    let mut chunk = [0u8; MAX_CHUNK_SIZE];
    let mut remaining = len;
    let mut offset = slot_offset;

    while remaining > 0 {
        let want = remaining.min(chunk_size);
        flash
            .read(offset, &mut chunk[..want])
            .map_err(|cause| CopyError::FlashRead { cause })?;
        let written = dest
            .write(&chunk[..want])
            .map_err(|cause| CopyError::StreamRead { cause })?;
        if written != want {
            return Err(CopyError::ShortWrite);
        }
        offset += want;
        remaining -= want;
    }

    Ok(())
}

/// Erases the primary flash slot and writes `src` into it. `len` is the
/// candidate's own declared length, checked against `slot_capacity` before
/// the slot is ever erased (§8 boundary behavior) — a candidate that doesn't
/// fit is refused outright rather than silently truncated into a shorter,
/// unvalidated image. The copy loop itself still walks the full
/// `slot_capacity` in `chunk_size`-aligned writes, same as [`backup`]'s
/// mirror image: a short read from `src` pads the tail of that chunk with
/// the erased-flash value and ends the copy, leaving the remainder of the
/// slot in its erased state.
pub fn write_image<FL: Flash, S: FsFile>(
    flash: &mut FL,
    slot_offset: usize,
    slot_capacity: usize,
    len: usize,
    src: &mut S,
    chunk_size: usize,
) -> Result<(), CopyError<S::Error>> {
    if len > slot_capacity {
        return Err(CopyError::CandidateTooLarge {
            len,
            capacity: slot_capacity,
        });
    }

    flash
        .erase(slot_offset, slot_offset + slot_capacity)
        .map_err(|cause| CopyError::FlashErase { cause })?;

    let chunk_size = chunk_size.min(MAX_CHUNK_SIZE);
    let mut chunk = [0xffu8; MAX_CHUNK_SIZE];
    let mut remaining = slot_capacity;
    let mut offset = slot_offset;

    while remaining > 0 {
        let want = remaining.min(chunk_size);
        let n = src
            .read(&mut chunk[..want])
            .map_err(|cause| CopyError::StreamRead { cause })?;
        if n == 0 {
            break;
        }
        if n < want {
            // Short read: pad the tail with the erased-flash value so the
            // write request stays a full, aligned chunk.
            chunk[n..want].fill(0xff);
        }
        flash
            .write(offset, &chunk[..want])
            .map_err(|cause| CopyError::FlashWrite { cause })?;
        offset += want;
        remaining -= want;
        if n < want {
            break;
        }
    }

    Ok(())
}

/// Restores a previously captured backup into the primary flash slot. The
/// inverse of [`backup`]: erase, then stream the backup stream back in. The
/// backup is always exactly `slot_capacity` bytes, since [`backup`] captured
/// the whole slot.
pub fn restore<FL: Flash, S: FsFile>(
    flash: &mut FL,
    slot_offset: usize,
    slot_capacity: usize,
    src: &mut S,
    chunk_size: usize,
) -> Result<(), CopyError<S::Error>> {
    write_image(flash, slot_offset, slot_capacity, slot_capacity, src, chunk_size)
}
