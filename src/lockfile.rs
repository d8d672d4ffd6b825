use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Exclusive `<file>.lock` used to replace a metadata file in one rename.
pub struct Lockfile {
    pub file_path: PathBuf,
    lock_path: PathBuf,
    lock: Option<File>,
}

impl Lockfile {
    pub fn new(file_path: PathBuf) -> Self {
        let mut lock_name = file_path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        lock_name.push(".lock");

        Lockfile {
            lock_path: file_path.with_file_name(lock_name),
            file_path,
            lock: None,
        }
    }

    pub fn hold_for_update(&mut self) -> Result<bool> {
        match self.lock {
            Some(_) => Ok(true),
            None => match OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&self.lock_path)
            {
                Ok(lock) => {
                    self.lock = Some(lock);
                    Ok(true)
                }
                Err(e) => match e.kind() {
                    std::io::ErrorKind::AlreadyExists => Ok(false),
                    _ => Err(e.into()),
                },
            },
        }
    }

    pub fn write(&mut self, content: &[u8]) -> Result<()> {
        let lock = self.lock.as_mut().ok_or_else(|| stale(&self.lock_path))?;
        lock.write_all(content)?;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        let lock = self.lock.take().ok_or_else(|| stale(&self.lock_path))?;
        lock.sync_all()?;
        drop(lock);
        fs::rename(&self.lock_path, &self.file_path)?;
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.lock.take().ok_or_else(|| stale(&self.lock_path))?;
        fs::remove_file(&self.lock_path)?;
        Ok(())
    }
}

fn stale(lock_path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("not holding lock on file: {}", lock_path.display()),
    ))
}

/// Replaces `path` with `content`, failing if the lock is already taken.
pub fn write_locked(path: &Path, content: &[u8]) -> Result<()> {
    let mut lockfile = Lockfile::new(path.to_path_buf());
    if !lockfile.hold_for_update()? {
        return Err(Error::LockHeld(path.to_path_buf()));
    }

    match lockfile.write(content) {
        Ok(()) => lockfile.commit(),
        Err(e) => {
            lockfile.rollback()?;
            Err(e)
        }
    }
}
