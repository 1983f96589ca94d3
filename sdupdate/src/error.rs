//! Error taxonomy (§7 of the design).
//!
//! Split in the same shape as the components that raise them: image parsing
//! and validation only ever touch the file-system collaborator, so
//! [`ImageError`] is generic over just that error type. The slot copier
//! touches both substrates, so [`CopyError`] carries both. [`UpdateError`]
//! is what the orchestrator surfaces, wrapping either of the above plus its
//! own terminal states.

use snafu::Snafu;

use storage::Error as FlashError;

#[derive(Debug, Snafu)]
pub enum ImageError<SE>
where
    SE: core::fmt::Debug,
{
    #[snafu(display("stream ended before the declared length was read"))]
    ShortRead,
    #[snafu(display("image header magic did not match the expected constant"))]
    BadMagic,
    #[snafu(display("protected TLV block length disagreed with the header"))]
    InconsistentTlv,
    #[snafu(display("SHA-256 TLV had an unexpected length"))]
    BadTlvLength,
    #[snafu(display("no SHA-256 TLV was present in the image"))]
    MissingDigest,
    #[snafu(display("computed digest did not match the embedded SHA-256 TLV"))]
    DigestMismatch,
    #[snafu(display("filesystem operation failed: {cause:?}"))]
    Io { cause: SE },
}

/// Errors from the slot copier. Flash-side failures are always
/// [`storage::Error`] since [`storage::Flash`] fixes its own error type;
/// only the file-system side is generic.
#[derive(Debug, Snafu)]
pub enum CopyError<SE>
where
    SE: core::fmt::Debug,
{
    #[snafu(display("fewer bytes were written than read during a copy"))]
    ShortWrite,
    #[snafu(display("candidate image ({len} bytes) exceeds the primary flash slot capacity ({capacity} bytes)"))]
    CandidateTooLarge { len: usize, capacity: usize },
    #[snafu(display("failed to read the primary flash slot: {cause:?}"))]
    FlashRead { cause: FlashError },
    #[snafu(display("failed to erase the primary flash slot: {cause:?}"))]
    FlashErase { cause: FlashError },
    #[snafu(display("failed to write the primary flash slot: {cause:?}"))]
    FlashWrite { cause: FlashError },
    #[snafu(display("failed to read the source stream: {cause:?}"))]
    StreamRead { cause: SE },
}

#[derive(Debug, Snafu)]
pub enum UpdateError<SE>
where
    SE: core::fmt::Debug,
{
    #[snafu(display("no candidate image found on the SD card"))]
    NoCandidate,
    #[snafu(display("{cause}"))]
    Image { cause: ImageError<SE> },
    #[snafu(display("{cause}"))]
    Copy { cause: CopyError<SE> },
    #[snafu(display("revert after a failed write also failed; device state is undefined"))]
    RevertFailed,
}

impl<SE> From<ImageError<SE>> for UpdateError<SE>
where
    SE: core::fmt::Debug,
{
    fn from(cause: ImageError<SE>) -> Self {
        UpdateError::Image { cause }
    }
}

impl<SE> From<CopyError<SE>> for UpdateError<SE>
where
    SE: core::fmt::Debug,
{
    fn from(cause: CopyError<SE>) -> Self {
        UpdateError::Copy { cause }
    }
}
