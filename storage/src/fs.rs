//! File-system collaborator.
//!
//! The update core reads its candidate image and writes its backup through
//! this trait pair rather than calling a concrete file API directly, so the
//! same core runs against a host-side simulator in tests and a real on-target
//! FAT driver in production. Mounting, directory listing and block-device
//! bring-up are the board's job; this module only names the shape of the
//! interface the core consumes.

/// Maximum file or directory name length this crate will hand back from a
/// directory listing. FAT short names and most sensible long names fit well
/// within this; it keeps [`DirEntry`] allocation-free.
pub const MAX_NAME_LEN: usize = 64;

pub type Name = heapless::String<MAX_NAME_LEN>;

/// How a file is opened.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OpenMode {
    /// Open an existing file for reading.
    Read,
    /// Create a file (truncating it if it already exists) for writing.
    Create,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: Name,
    pub kind: EntryKind,
}

/// An open file on the removable medium.
///
/// `seek` is absolute (equivalent to the collaborator interface's
/// `whence=SET`); the core never needs relative seeks.
pub trait File {
    type Error: core::fmt::Debug;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error>;
    fn seek(&mut self, offset: u64) -> Result<(), Self::Error>;
}

/// A single, already-opened directory listing.
pub trait DirIter {
    type Error: core::fmt::Debug;

    /// Returns the next entry, or `Ok(None)` once the directory is exhausted.
    fn next_entry(&mut self) -> Result<Option<DirEntry>, Self::Error>;
}

/// The removable medium itself: mount state plus file/directory operations.
pub trait Filesystem {
    type Error: core::fmt::Debug;
    type File: File<Error = Self::Error>;
    type Dir: DirIter<Error = Self::Error>;

    fn mount(&mut self) -> Result<(), Self::Error>;
    fn unmount(&mut self) -> Result<(), Self::Error>;

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, Self::Error>;
    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error>;
    fn unlink(&mut self, path: &str) -> Result<(), Self::Error>;
}
