//! Update orchestrator (§4.5): the top-level state machine chaining
//! discovery, validation, backup, write, optional revert, and cleanup.

use core::fmt::Write as _;

use log::{debug, error, info, warn};

use storage::fs::{DirIter, EntryKind, File as _, Filesystem, OpenMode};
use storage::Flash;

use crate::copier::{backup, restore, write_image};
use crate::error::UpdateError;
use crate::header::read_header;
use crate::session::UpdateSession;
use crate::validate::validate;

/// Maximum length of a joined path (`mount_point/update_dir/file_name`).
/// Generous for FAT8.3 or a reasonable long name; kept fixed so path
/// assembly stays allocation-free.
const MAX_PATH_LEN: usize = 192;
type Path = heapless::String<MAX_PATH_LEN>;

/// The four names and the chunk size the original firmware fixed at compile
/// time via `CONFIG_SD_UPDATE_*` macros (§6.4).
#[derive(Debug, Clone, Copy)]
pub struct Config<'a> {
    pub mount_point: &'a str,
    pub update_dir: &'a str,
    pub image_file_name: &'a str,
    pub backup_file_name: &'a str,
    pub chunk_size: usize,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Config {
            mount_point: "/SD:",
            update_dir: "update",
            image_file_name: "firmware.bin",
            backup_file_name: "backup.bin",
            chunk_size: 256,
        }
    }
}

fn join(parts: &[&str]) -> Path {
    let mut path = Path::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            let _ = path.push('/');
        }
        let _ = write!(path, "{part}");
    }
    path
}

/// Runs one update attempt to completion. Returns `true` iff a new image
/// was installed and committed to the primary flash slot.
pub fn do_update<FS, FL>(config: &Config, fs: &mut FS, flash: &mut FL) -> bool
where
    FS: Filesystem,
    FL: Flash,
{
    info!("sdupdate: mounting SD substrate at {}", config.mount_point);
    if let Err(cause) = fs.mount() {
        error!("sdupdate: mount failed: {cause:?}");
        return false;
    }

    let outcome = run_attempt(config, fs, flash);

    match &outcome {
        Ok(true) => info!("sdupdate: update installed"),
        Ok(false) => info!("sdupdate: no update installed"),
        Err(cause) => warn!("sdupdate: attempt ended with error: {cause}"),
    }

    if let Err(cause) = fs.unmount() {
        error!("sdupdate: unmount failed: {cause:?}");
    }

    matches!(outcome, Ok(true))
}

fn run_attempt<FS, FL>(
    config: &Config,
    fs: &mut FS,
    flash: &mut FL,
) -> Result<bool, UpdateError<FS::Error>>
where
    FS: Filesystem,
    FL: Flash,
{
    let dir_path = join(&[config.mount_point, config.update_dir]);

    debug!("sdupdate: scanning {dir_path} for a candidate image");
    let candidate_name = discover(fs, &dir_path, config.image_file_name)?;
    let candidate_path = join(&[dir_path.as_str(), candidate_name.as_str()]);

    let mut candidate_file = fs
        .open(&candidate_path, OpenMode::Read)
        .map_err(|cause| UpdateError::Image {
            cause: crate::error::ImageError::Io { cause },
        })?;
    let header = read_header(&mut candidate_file)?;
    let mut session = UpdateSession::new(candidate_file, header);

    info!("sdupdate: validating {candidate_path}");
    let candidate_len = match validate(&mut session.file, config.chunk_size) {
        Ok((_, candidate_len)) => candidate_len,
        Err(cause) => {
            warn!("sdupdate: validation failed: {cause}");
            return Err(cause.into());
        }
    };

    let slot_size = flash.capacity();
    let backup_path = join(&[dir_path.as_str(), config.backup_file_name]);

    // Idempotent reset: discard any prior backup before recreating it.
    let _ = fs.unlink(&backup_path);

    info!("sdupdate: backing up primary slot to {backup_path}");
    let mut backup_file = fs
        .open(&backup_path, OpenMode::Create)
        .map_err(|cause| UpdateError::Image {
            cause: crate::error::ImageError::Io { cause },
        })?;
    backup(flash, 0, slot_size, &mut backup_file, config.chunk_size).map_err(UpdateError::from)?;

    info!("sdupdate: writing candidate image to the primary slot");
    session
        .file
        .seek(0)
        .map_err(|cause| UpdateError::Image {
            cause: crate::error::ImageError::Io { cause },
        })?;

    match write_image(
        flash,
        0,
        slot_size,
        candidate_len as usize,
        &mut session.file,
        config.chunk_size,
    ) {
        Ok(()) => {
            let _ = fs.unlink(&candidate_path);
            Ok(true)
        }
        Err(write_err) => {
            warn!("sdupdate: write failed ({write_err}), reverting from backup");
            drop(backup_file);
            // restore() wants a read-only stream (§4.4); the handle backup()
            // wrote through can't be read back from.
            let mut backup_reader = fs
                .open(&backup_path, OpenMode::Read)
                .map_err(|cause| UpdateError::Image {
                    cause: crate::error::ImageError::Io { cause },
                })?;
            match restore(flash, 0, slot_size, &mut backup_reader, config.chunk_size) {
                Ok(()) => Ok(false),
                Err(_) => {
                    error!("sdupdate: revert failed; device state is undefined");
                    Err(UpdateError::RevertFailed)
                }
            }
        }
    }
}

fn discover<FS>(
    fs: &mut FS,
    dir_path: &str,
    image_file_name: &str,
) -> Result<storage::fs::Name, UpdateError<FS::Error>>
where
    FS: Filesystem,
{
    let mut dir = fs
        .open_dir(dir_path)
        .map_err(|cause| UpdateError::Image {
            cause: crate::error::ImageError::Io { cause },
        })?;

    while let Some(entry) = dir
        .next_entry()
        .map_err(|cause| UpdateError::Image {
            cause: crate::error::ImageError::Io { cause },
        })?
    {
        if entry.kind == EntryKind::File && entry.name.eq_ignore_ascii_case(image_file_name) {
            return Ok(entry.name);
        }
    }

    Err(UpdateError::NoCandidate)
}
