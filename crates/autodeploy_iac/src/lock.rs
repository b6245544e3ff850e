//! Exclusive ownership of a working directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{IacError, IacResult};

/// Lock marker created in every working directory.
pub const LOCK_FILE: &str = ".autodeploy.lock";

/// Advisory lock held for the lifetime of a deployment session.
///
/// The lock is released when the value is dropped. The marker file itself is
/// left in place so that a concurrent opener always locks the same inode.
#[derive(Debug)]
pub struct WorkdirLock {
    file: File,
    path: PathBuf,
}

impl WorkdirLock {
    /// Take the lock on `dir`, failing fast if another session holds it.
    pub fn acquire(dir: &Path) -> IacResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == std::io::ErrorKind::WouldBlock
            {
                return Err(IacError::DirectoryBusy(dir.to_path_buf()));
            }
            return Err(e.into());
        }

        debug!("Acquired lock {:?}", path);
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {:?}: {}", self.path, e);
        } else {
            debug!("Released lock {:?}", self.path);
        }
    }
}
