//! In-flight update attempt state (§3 "Update Session").

use storage::fs::File;

use crate::header::ImageHeader;

/// Owns the open candidate file handle and its parsed header for the
/// duration of one update attempt. Dropping a session closes the file —
/// the scoped-resource-guard replacement for the source's goto-based
/// cleanup (§9).
pub struct UpdateSession<F> {
    pub file: F,
    pub header: ImageHeader,
}

impl<F: File> UpdateSession<F> {
    pub fn new(file: F, header: ImageHeader) -> Self {
        UpdateSession { file, header }
    }
}
