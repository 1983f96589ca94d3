//! End-to-end scenarios (§8) driving the real orchestrator against
//! `simdevice`'s simulated flash and SD-card filesystem.

use sdupdate::{do_update, Config};
use simdevice::fs::SimFs;
use simdevice::gen::GenBuilder;
use simdevice::SimFlash;
use storage::fs::{File as _, Filesystem, OpenMode};
use storage::{Error as StorageError, Flash, ReadFlash, Result as StorageResult};

const CONFIG: Config = Config {
    mount_point: "/SD:",
    update_dir: "update",
    image_file_name: "firmware.bin",
    backup_file_name: "backup.bin",
    chunk_size: 256,
};

const CAPACITY: usize = 4096;

fn env() -> (SimFs, SimFlash) {
    let _ = env_logger::builder().is_test(true).try_init();

    let fs = SimFs::new().unwrap();
    fs.create_dir("/SD:/update").unwrap();
    let flash = SimFlash::new(1, 256, 256, CAPACITY / 256).unwrap();
    (fs, flash)
}

fn fill(flash: &mut SimFlash, byte: u8) {
    flash.install(&vec![byte; CAPACITY], 0).unwrap();
}

fn read_file(fs: &mut SimFs, path: &str) -> Option<Vec<u8>> {
    let mut file = fs.open(path, OpenMode::Read).ok()?;
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = file.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Some(out)
}

#[test]
fn happy_path_installs_and_cleans_up() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0xaa);

    let image = GenBuilder::default().size(2048).build();
    fs.write_file("/SD:/update/firmware.bin", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(installed);

    let mut expected = image.data.clone();
    expected.resize(CAPACITY, 0xff);
    assert_eq!(flash.contents(), expected.as_slice());

    let backup = read_file(&mut fs, "/SD:/update/backup.bin").unwrap();
    assert_eq!(backup, vec![0xaa; CAPACITY]);

    assert!(read_file(&mut fs, "/SD:/update/firmware.bin").is_none());
}

#[test]
fn no_candidate_leaves_flash_untouched() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0x55);

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(!installed);
    assert_eq!(flash.contents(), vec![0x55; CAPACITY].as_slice());
}

#[test]
fn corrupt_digest_is_rejected_and_candidate_retained() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0x55);

    let image = GenBuilder::default().size(512).with_corrupt_digest().build();
    fs.write_file("/SD:/update/firmware.bin", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(!installed);
    assert_eq!(flash.contents(), vec![0x55; CAPACITY].as_slice());
    assert!(read_file(&mut fs, "/SD:/update/firmware.bin").is_some());
}

#[test]
fn missing_digest_tlv_is_rejected() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0x55);

    let image = GenBuilder::default().size(512).without_digest_tlv().build();
    fs.write_file("/SD:/update/firmware.bin", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(!installed);
    assert_eq!(flash.contents(), vec![0x55; CAPACITY].as_slice());
}

#[test]
fn candidate_larger_than_slot_is_rejected_and_flash_untouched() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0x55);

    // Payload alone already exceeds the slot once header and TLV trailer
    // are added, so a naive slot-capped copy would silently truncate it.
    let image = GenBuilder::default().size(CAPACITY + 1024).build();
    fs.write_file("/SD:/update/firmware.bin", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(!installed);
    assert_eq!(flash.contents(), vec![0x55; CAPACITY].as_slice());
    assert!(read_file(&mut fs, "/SD:/update/firmware.bin").is_some());
}

#[test]
fn case_insensitive_filename_match_installs() {
    let (mut fs, mut flash) = env();
    fill(&mut flash, 0xaa);

    let image = GenBuilder::default().size(1024).build();
    fs.write_file("/SD:/update/FIRMWARE.BIN", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(installed);

    let mut expected = image.data.clone();
    expected.resize(CAPACITY, 0xff);
    assert_eq!(flash.contents(), expected.as_slice());
}

/// Wraps a [`SimFlash`] and fails exactly its `fail_on_write`-th `write`
/// call, so the orchestrator's WRITE step can be driven into REVERT.
struct FlakyFlash {
    inner: SimFlash,
    fail_on_write: usize,
    writes: usize,
}

impl ReadFlash for FlakyFlash {
    fn read_size(&self) -> usize {
        self.inner.read_size()
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> StorageResult<()> {
        self.inner.read(offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl Flash for FlakyFlash {
    fn write_size(&self) -> usize {
        self.inner.write_size()
    }

    fn erase_size(&self) -> usize {
        self.inner.erase_size()
    }

    fn erase(&mut self, from: usize, to: usize) -> StorageResult<()> {
        self.inner.erase(from, to)
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> StorageResult<()> {
        self.writes += 1;
        if self.writes == self.fail_on_write {
            return Err(StorageError::NotWritten);
        }
        self.inner.write(offset, bytes)
    }
}

#[test]
fn write_failure_triggers_successful_revert() {
    let (mut fs, flash) = env();
    let mut flash = FlakyFlash {
        inner: flash,
        fail_on_write: 3,
        writes: 0,
    };
    fill(&mut flash.inner, 0xaa);

    let image = GenBuilder::default().size(2000).build();
    fs.write_file("/SD:/update/firmware.bin", &image.data).unwrap();

    let installed = do_update(&CONFIG, &mut fs, &mut flash);
    assert!(!installed);
    assert_eq!(flash.inner.contents(), vec![0xaa; CAPACITY].as_slice());
    assert!(read_file(&mut fs, "/SD:/update/firmware.bin").is_some());
}
