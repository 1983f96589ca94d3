//! A `std::fs`-backed stand-in for the removable SD-card medium, implementing
//! [`storage::fs::Filesystem`] the same way [`crate::SimFlash`] stands in for
//! on-chip flash.
//!
//! Paths are resolved relative to a fresh [`TempDir`], so each [`SimFs`]
//! instance behaves like a freshly formatted card: callers address it with
//! absolute-looking paths (e.g. `/update/firmware.bin`), and the leading
//! slash is simply stripped before joining onto the temp root.

use std::fs;
use std::io;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use temp_dir::TempDir;

use storage::fs::{DirEntry, DirIter, EntryKind, File as FsFile, Filesystem, Name, OpenMode};

pub struct SimFs {
    root: TempDir,
}

impl SimFs {
    pub fn new() -> io::Result<Self> {
        Ok(SimFs {
            root: TempDir::new()?,
        })
    }

    /// Pre-creates a directory (e.g. the conventional `update` directory) so
    /// tests don't need a real mount step to populate the card.
    pub fn create_dir(&self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(path))
    }

    pub fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path), data)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.path().join(path.trim_start_matches('/'))
    }
}

pub struct SimFile {
    file: fs::File,
}

impl FsFile for SimFile {
    type Error = io::Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.file.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.file.write(buf)
    }

    fn seek(&mut self, offset: u64) -> Result<(), Self::Error> {
        self.file.seek(SeekFrom::Start(offset)).map(|_| ())
    }
}

pub struct SimDirIter {
    entries: std::vec::IntoIter<DirEntry>,
}

impl DirIter for SimDirIter {
    type Error = io::Error;

    fn next_entry(&mut self) -> Result<Option<DirEntry>, Self::Error> {
        Ok(self.entries.next())
    }
}

impl Filesystem for SimFs {
    type Error = io::Error;
    type File = SimFile;
    type Dir = SimDirIter;

    fn mount(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn unmount(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn open_dir(&mut self, path: &str) -> Result<Self::Dir, Self::Error> {
        let dir = self.resolve(path);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name_str = file_name.to_str().unwrap_or_default();
            let mut name = Name::new();
            let _ = name.push_str(name_str);
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry { name, kind });
        }
        Ok(SimDirIter {
            entries: entries.into_iter(),
        })
    }

    fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let path: &Path = &self.resolve(path);
        let file = match mode {
            OpenMode::Read => fs::File::open(path)?,
            OpenMode::Create => fs::File::create(path)?,
        };
        Ok(SimFile { file })
    }

    fn unlink(&mut self, path: &str) -> Result<(), Self::Error> {
        fs::remove_file(self.resolve(path))
    }
}
