//! Image header layout (§3, §6.5).
//!
//! Binary-compatible with the MCUboot image header: a fixed, `repr(C)`
//! struct read once at offset 0 of the candidate file.

use asraw::{AsMutRaw, AsRaw};
use storage::fs::File;

use crate::error::ImageError;
use crate::util::read_exact;

/// Required value of [`ImageHeader::magic`].
pub const IMAGE_MAGIC: u32 = 0x96f3_b83d;

/// Pseudo-semantic version carried by the header. Not consulted by the
/// core; read past without interpretation per §3.
#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
pub struct ImageVersion {
    pub major: u8,
    pub minor: u8,
    pub revision: u16,
    pub build_num: u32,
}

impl AsRaw for ImageVersion {}
unsafe impl AsMutRaw for ImageVersion {}

/// The fixed-layout header at the beginning of every candidate image.
#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
pub struct ImageHeader {
    pub magic: u32,
    /// Load address; unused by this core, carried for layout fidelity.
    pub load_addr: u32,
    /// Byte length of the header region; the payload begins here.
    pub header_size: u16,
    /// Byte length of the optional protected TLV block; may be zero.
    pub protected_tlv_size: u16,
    /// Byte length of the executable payload.
    pub image_size: u32,
    /// Unused by this core, carried for layout fidelity.
    pub flags: u32,
    pub version: ImageVersion,
    pub pad1: u32,
}

impl AsRaw for ImageHeader {}
unsafe impl AsMutRaw for ImageHeader {}

impl ImageHeader {
    /// Offset of the first byte after the payload: where the TLV trailer
    /// begins.
    pub fn tlv_base(&self) -> u64 {
        self.header_size as u64 + self.image_size as u64
    }

    /// Number of bytes covered by the digest domain: header + payload +
    /// protected TLV block.
    pub fn digest_len(&self) -> u64 {
        self.tlv_base() + self.protected_tlv_size as u64
    }
}

/// Reads and validates the header at offset 0 of `file` (4.1 `read_header`).
///
/// Fails with [`ImageError::ShortRead`] if the stream is shorter than the
/// header, or [`ImageError::BadMagic`] if the magic doesn't match.
pub fn read_header<F: File>(file: &mut F) -> Result<ImageHeader, ImageError<F::Error>> {
    file.seek(0).map_err(|cause| ImageError::Io { cause })?;

    let mut header = ImageHeader::default();
    read_exact(file, header.as_mut_raw())?;

    if header.magic != IMAGE_MAGIC {
        return Err(ImageError::BadMagic);
    }

    Ok(header)
}
