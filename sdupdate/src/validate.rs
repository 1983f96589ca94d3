//! Full image validation: header, TLV walk, digest, constant-time compare
//! (§4.3).

use subtle::ConstantTimeEq;

use storage::fs::File;

use crate::digest::compute_digest;
use crate::error::ImageError;
use crate::header::{read_header, ImageHeader};
use crate::tlv::{tlv_iter_begin, SHA256_TLV_LEN, SHA256_TLV_TYPE};

/// Reads the header, computes the digest over the digest domain, locates the
/// SHA-256 TLV, and compares the two in constant time (I3). Returns the
/// validated header plus the candidate's total on-disk length (header +
/// payload + both TLV blocks), so callers know how much of the slot the
/// candidate actually needs without a second pass over the file.
pub fn validate<F: File>(
    file: &mut F,
    chunk_size: usize,
) -> Result<(ImageHeader, u64), ImageError<F::Error>> {
    let header = read_header(file)?;
    let computed = compute_digest(file, &header, chunk_size)?;

    let mut iter = tlv_iter_begin(file, &header)?;
    let candidate_len = iter.total_len();
    let mut embedded: Option<[u8; 32]> = None;

    while let Some(record) = iter.next_record()? {
        if record.kind != SHA256_TLV_TYPE {
            continue;
        }
        if record.length != SHA256_TLV_LEN {
            return Err(ImageError::BadTlvLength);
        }
        let mut buf = [0u8; 32];
        iter.read_value(&record, &mut buf)?;
        embedded = Some(buf);
        break;
    }

    let embedded = embedded.ok_or(ImageError::MissingDigest)?;

    if computed.ct_eq(&embedded).into() {
        Ok((header, candidate_len))
    } else {
        Err(ImageError::DigestMismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::IMAGE_MAGIC;
    use crate::testutil::MemFile;
    use sha2::{Digest, Sha256};

    fn image_with_digest(payload: &[u8], digest: [u8; 32]) -> Vec<u8> {
        let mut bytes = vec![0u8; 32];
        bytes[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        bytes[8..10].copy_from_slice(&32u16.to_le_bytes());
        bytes[12..16].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(payload);

        let mut tlv = Vec::new();
        tlv.extend_from_slice(&SHA256_TLV_TYPE.to_le_bytes());
        tlv.extend_from_slice(&32u16.to_le_bytes());
        tlv.extend_from_slice(&digest);
        let total_size = 8 + tlv.len() as u32;

        bytes.extend_from_slice(&crate::tlv::TLV_INFO_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&total_size.to_le_bytes());
        bytes.extend_from_slice(&tlv);
        bytes
    }

    #[test]
    fn accepts_well_formed_image() {
        let payload = b"firmware-bytes";
        let mut header_and_payload = vec![0u8; 32];
        header_and_payload[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        header_and_payload[8..10].copy_from_slice(&32u16.to_le_bytes());
        header_and_payload[12..16].copy_from_slice(&(payload.len() as u32).to_le_bytes());
        header_and_payload.extend_from_slice(payload);
        let digest: [u8; 32] = Sha256::digest(&header_and_payload).into();

        let bytes = image_with_digest(payload, digest);
        let mut file = MemFile::new(bytes);
        assert!(validate(&mut file, 256).is_ok());
    }

    #[test]
    fn rejects_tampered_payload() {
        let payload = b"firmware-bytes";
        let bogus_digest = [0u8; 32];
        let bytes = image_with_digest(payload, bogus_digest);
        let mut file = MemFile::new(bytes);
        assert!(matches!(validate(&mut file, 256), Err(ImageError::DigestMismatch)));
    }

    #[test]
    fn rejects_missing_digest_tlv() {
        let mut bytes = vec![0u8; 32];
        bytes[0..4].copy_from_slice(&IMAGE_MAGIC.to_le_bytes());
        bytes[8..10].copy_from_slice(&32u16.to_le_bytes());
        bytes.extend_from_slice(&crate::tlv::TLV_INFO_MAGIC.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());

        let mut file = MemFile::new(bytes);
        assert!(matches!(validate(&mut file, 256), Err(ImageError::MissingDigest)));
    }
}
