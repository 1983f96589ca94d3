//! Synthetic image generation.
//!
//! Builds bit-exact MCUboot-style images (§6.5) in pure Rust, without
//! shelling out to an external signing tool: header, payload, optional
//! protected TLV block, and an unprotected TLV block carrying the SHA-256
//! digest. Used by `sdupdate`'s end-to-end tests to produce well-formed and
//! deliberately-broken candidate images against the real validator.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use sha2::{Digest, Sha256};

/// `ImageHeader::magic` (§6.5).
pub const IMAGE_MAGIC: u32 = 0x96f3_b83d;
/// Protected TLV info block magic.
pub const TLV_PROT_INFO_MAGIC: u16 = 0x6908;
/// Unprotected TLV info block magic.
pub const TLV_INFO_MAGIC: u16 = 0x6907;
/// TLV type carrying the SHA-256 digest.
pub const SHA256_TLV_TYPE: u16 = 0x10;

const HEADER_SIZE: u16 = 32;
const INFO_HEADER_SIZE: usize = 8;
const RECORD_HEADER_SIZE: usize = 4;

pub struct GeneratedImage {
    pub data: Vec<u8>,
    /// The digest a correctly validating reader will recompute. Builders
    /// that deliberately corrupt the embedded TLV still report the true
    /// value here so tests can tell the two apart.
    pub digest: [u8; 32],
}

/// Builds one synthetic candidate image.
///
/// Defaults to a well-formed image with no protected TLV block and a
/// correct embedded digest; the `without_*`/`with_*` methods introduce the
/// specific malformations exercised by the boundary-behavior tests in §8.
pub struct GenBuilder {
    payload_size: usize,
    seed: u64,
    protected_tlv: Vec<u8>,
    include_digest_tlv: bool,
    corrupt_digest: bool,
}

impl Default for GenBuilder {
    fn default() -> Self {
        GenBuilder {
            payload_size: 65536,
            seed: 1,
            protected_tlv: Vec::new(),
            include_digest_tlv: true,
            corrupt_digest: false,
        }
    }
}

impl GenBuilder {
    pub fn size(&mut self, size: usize) -> &mut Self {
        self.payload_size = size;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Adds a raw protected-TLV record, making the image carry a non-empty
    /// protected block (included in the digest domain).
    pub fn protected_record(&mut self, kind: u16, value: &[u8]) -> &mut Self {
        push_record(&mut self.protected_tlv, kind, value);
        self
    }

    /// Omits the SHA-256 TLV from the unprotected block entirely, producing
    /// the *missing digest* scenario.
    pub fn without_digest_tlv(&mut self) -> &mut Self {
        self.include_digest_tlv = false;
        self
    }

    /// Embeds an all-zero SHA-256 TLV instead of the true digest, producing
    /// the *corrupt digest* scenario.
    pub fn with_corrupt_digest(&mut self) -> &mut Self {
        self.corrupt_digest = true;
        self
    }

    pub fn build(&self) -> GeneratedImage {
        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let mut payload = vec![0u8; self.payload_size];
        rng.fill_bytes(&mut payload);

        let protected_tlv_size = if self.protected_tlv.is_empty() {
            0u16
        } else {
            (INFO_HEADER_SIZE + self.protected_tlv.len()) as u16
        };

        let mut header = Vec::with_capacity(HEADER_SIZE as usize);
        header.extend_from_slice(&IMAGE_MAGIC.to_le_bytes()); // magic
        header.extend_from_slice(&0u32.to_le_bytes()); // load_addr
        header.extend_from_slice(&HEADER_SIZE.to_le_bytes()); // header_size
        header.extend_from_slice(&protected_tlv_size.to_le_bytes()); // protected_tlv_size
        header.extend_from_slice(&(self.payload_size as u32).to_le_bytes()); // image_size
        header.extend_from_slice(&0u32.to_le_bytes()); // flags
        header.extend_from_slice(&[0u8; 8]); // version
        header.extend_from_slice(&0u32.to_le_bytes()); // pad1
        debug_assert_eq!(header.len(), HEADER_SIZE as usize);

        let mut protected_block = Vec::new();
        if protected_tlv_size != 0 {
            push_info(
                &mut protected_block,
                TLV_PROT_INFO_MAGIC,
                protected_tlv_size as u32,
            );
            protected_block.extend_from_slice(&self.protected_tlv);
        }

        let mut digest_domain = Vec::new();
        digest_domain.extend_from_slice(&header);
        digest_domain.extend_from_slice(&payload);
        digest_domain.extend_from_slice(&protected_block);
        let digest: [u8; 32] = Sha256::digest(&digest_domain).into();

        let mut unprotected_tlv = Vec::new();
        if self.include_digest_tlv {
            let embedded = if self.corrupt_digest { [0u8; 32] } else { digest };
            push_record(&mut unprotected_tlv, SHA256_TLV_TYPE, &embedded);
        }
        let unprotected_total = (INFO_HEADER_SIZE + unprotected_tlv.len()) as u32;

        let mut data = Vec::new();
        data.extend_from_slice(&header);
        data.extend_from_slice(&payload);
        data.extend_from_slice(&protected_block);
        push_info(&mut data, TLV_INFO_MAGIC, unprotected_total);
        data.extend_from_slice(&unprotected_tlv);

        GeneratedImage { data, digest }
    }
}

fn push_info(bytes: &mut Vec<u8>, magic: u16, total_size: u32) {
    bytes.extend_from_slice(&magic.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&total_size.to_le_bytes());
}

fn push_record(bytes: &mut Vec<u8>, kind: u16, value: &[u8]) {
    bytes.extend_from_slice(&kind.to_le_bytes());
    bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
    bytes.extend_from_slice(value);
    debug_assert_eq!(RECORD_HEADER_SIZE, 4);
}
