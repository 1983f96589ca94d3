//! TLV trailer walker (§4.1, §6.5).

use asraw::{AsMutRaw, AsRaw};
use storage::fs::File;

use crate::error::ImageError;
use crate::header::ImageHeader;
use crate::util::read_exact;

/// Magic marking the protected TLV info block.
pub const TLV_PROT_INFO_MAGIC: u16 = 0x6908;
/// Magic marking the unprotected TLV info block.
pub const TLV_INFO_MAGIC: u16 = 0x6907;
/// TLV type carrying the SHA-256 digest.
pub const SHA256_TLV_TYPE: u16 = 0x10;
/// Required length of the SHA-256 TLV value.
pub const SHA256_TLV_LEN: u16 = 32;

#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
struct TlvInfo {
    magic: u16,
    _pad: u16,
    total_size: u32,
}

impl AsRaw for TlvInfo {}
unsafe impl AsMutRaw for TlvInfo {}

#[derive(Debug, Default, Clone, Copy)]
#[repr(C)]
struct TlvRecordHeader {
    kind: u16,
    length: u16,
}

impl AsRaw for TlvRecordHeader {}
unsafe impl AsMutRaw for TlvRecordHeader {}

/// A TLV record's location within the unprotected block, as handed back by
/// [`TlvIter`]. The value itself is not read; see [`TlvIter::read_value`].
#[derive(Debug, Clone, Copy)]
pub struct TlvRecord {
    pub offset: u64,
    pub kind: u16,
    pub length: u16,
}

fn read_tlv_info<F: File>(file: &mut F, at: u64) -> Result<TlvInfo, ImageError<F::Error>> {
    file.seek(at).map_err(|cause| ImageError::Io { cause })?;
    let mut info = TlvInfo::default();
    read_exact(file, info.as_mut_raw())?;
    Ok(info)
}

/// Walks only the unprotected TLV block's record area.
pub struct TlvIter<'f, F> {
    file: &'f mut F,
    current: u64,
    end: u64,
}

/// Seeks to the TLV trailer and locates the unprotected block's record area
/// (4.1 `tlv_iter_begin`), enforcing I2 along the way.
pub fn tlv_iter_begin<'f, F: File>(
    file: &'f mut F,
    header: &ImageHeader,
) -> Result<TlvIter<'f, F>, ImageError<F::Error>> {
    let base = header.tlv_base();
    let info = read_tlv_info(file, base)?;

    let unprot_base = if info.magic == TLV_PROT_INFO_MAGIC {
        if info.total_size != header.protected_tlv_size as u32 {
            return Err(ImageError::InconsistentTlv);
        }
        let unprot_base = base + info.total_size as u64;
        let unprot_info = read_tlv_info(file, unprot_base)?;
        if unprot_info.magic != TLV_INFO_MAGIC {
            return Err(ImageError::InconsistentTlv);
        }
        return Ok(TlvIter {
            file,
            current: unprot_base + core::mem::size_of::<TlvInfo>() as u64,
            end: unprot_base + unprot_info.total_size as u64,
        });
    } else if info.magic == TLV_INFO_MAGIC {
        if header.protected_tlv_size != 0 {
            return Err(ImageError::InconsistentTlv);
        }
        base
    } else {
        return Err(ImageError::InconsistentTlv);
    };

    Ok(TlvIter {
        file,
        current: unprot_base + core::mem::size_of::<TlvInfo>() as u64,
        end: unprot_base + info.total_size as u64,
    })
}

impl<'f, F: File> TlvIter<'f, F> {
    /// The offset one past the end of the unprotected TLV block — the total
    /// length of the candidate image on disk, since that block is always
    /// the file's trailer.
    pub fn total_len(&self) -> u64 {
        self.end
    }

    /// Returns the next TLV record's location, or `None` once the block is
    /// exhausted. A record whose declared length would read past the
    /// block's end is never yielded — iteration simply ends (fail-safe
    /// boundary behavior from §8).
    pub fn next_record(&mut self) -> Result<Option<TlvRecord>, ImageError<F::Error>> {
        if self.current >= self.end {
            return Ok(None);
        }

        self.file
            .seek(self.current)
            .map_err(|cause| ImageError::Io { cause })?;
        let mut rh = TlvRecordHeader::default();
        read_exact(self.file, rh.as_mut_raw())?;

        let record_offset = self.current + core::mem::size_of::<TlvRecordHeader>() as u64;
        let next_current = record_offset + rh.length as u64;

        if next_current > self.end {
            self.current = self.end;
            return Ok(None);
        }

        self.current = next_current;
        Ok(Some(TlvRecord {
            offset: record_offset,
            kind: rh.kind,
            length: rh.length,
        }))
    }

    /// Reads a record's value given its returned offset and length. Callers
    /// drive this themselves so the iterator never buffers a value larger
    /// than the caller actually wants.
    pub fn read_value(
        &mut self,
        record: &TlvRecord,
        buf: &mut [u8],
    ) -> Result<(), ImageError<F::Error>> {
        self.file
            .seek(record.offset)
            .map_err(|cause| ImageError::Io { cause })?;
        read_exact(self.file, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{read_header, IMAGE_MAGIC};
    use crate::testutil::MemFile;

    fn push_header(bytes: &mut Vec<u8>, image_size: u32, protected_tlv_size: u16) {
        bytes.resize(32, 0);
        bytes[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        bytes[8..10].copy_from_slice(&32u16.to_le_bytes());
        bytes[10..12].copy_from_slice(&protected_tlv_size.to_le_bytes());
        bytes[12..16].copy_from_slice(&image_size.to_le_bytes());
    }

    fn push_tlv_info(bytes: &mut Vec<u8>, magic: u16, total_size: u32) {
        bytes.extend_from_slice(&magic.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&total_size.to_le_bytes());
    }

    fn push_record(bytes: &mut Vec<u8>, kind: u16, value: &[u8]) {
        bytes.extend_from_slice(&kind.to_le_bytes());
        bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
        bytes.extend_from_slice(value);
    }

    #[test]
    fn no_protected_block_requires_zero_size() {
        let mut bytes = Vec::new();
        push_header(&mut bytes, 10, 0);
        bytes.resize(32 + 10, 0xaa);
        push_tlv_info(&mut bytes, TLV_INFO_MAGIC, 8 + 4 + 4);
        push_record(&mut bytes, 7, &[1, 2, 3, 4]);

        let mut file = MemFile::new(bytes);
        let header = read_header(&mut file).unwrap();
        let mut iter = tlv_iter_begin(&mut file, &header).unwrap();
        let rec = iter.next_record().unwrap().unwrap();
        assert_eq!(rec.kind, 7);
        assert_eq!(rec.length, 4);
        assert!(iter.next_record().unwrap().is_none());
    }

    #[test]
    fn mismatched_protected_size_is_rejected() {
        let mut bytes = Vec::new();
        push_header(&mut bytes, 10, 99);
        bytes.resize(32 + 10, 0xaa);
        push_tlv_info(&mut bytes, TLV_PROT_INFO_MAGIC, 8); // claims 8, header says 99
        push_tlv_info(&mut bytes, TLV_INFO_MAGIC, 8);

        let mut file = MemFile::new(bytes);
        let header = read_header(&mut file).unwrap();
        assert!(matches!(
            tlv_iter_begin(&mut file, &header),
            Err(ImageError::InconsistentTlv)
        ));
    }

    #[test]
    fn oversized_record_length_ends_iteration_without_spurious_records() {
        let mut bytes = Vec::new();
        push_header(&mut bytes, 0, 0);
        push_tlv_info(&mut bytes, TLV_INFO_MAGIC, 8 + 4);
        // Record declares a length that would run past the block's end.
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&9000u16.to_le_bytes());

        let mut file = MemFile::new(bytes);
        let header = read_header(&mut file).unwrap();
        let mut iter = tlv_iter_begin(&mut file, &header).unwrap();
        assert!(iter.next_record().unwrap().is_none());
    }
}
