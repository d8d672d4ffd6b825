use std::{fs, path::PathBuf};

use crate::error::{Error, Result};
use crate::lockfile::write_locked;
use crate::oid::Oid;

use super::paths::ensure_dir;

pub const DEFAULT_BRANCH: &str = "refs/heads/master";

/// What `HEAD` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// `ref: <name>`
    Symbolic(String),
    Detached(Oid),
}

pub struct Refs {
    root: PathBuf,
}

impl Refs {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn head_path(&self) -> PathBuf {
        self.root.join("HEAD")
    }

    pub fn init(&self) -> Result<()> {
        ensure_dir(&self.root.join("refs/tags"), true)?;
        ensure_dir(&self.root.join("refs/heads"), true)?;
        self.set_head(&Head::Symbolic(DEFAULT_BRANCH.to_owned()))
    }

    pub fn set_head(&self, head: &Head) -> Result<()> {
        let content = match head {
            Head::Symbolic(name) => format!("ref: {name}\n"),
            Head::Detached(oid) => format!("{oid}\n"),
        };
        write_locked(&self.head_path(), content.as_bytes())
    }

    pub fn head(&self) -> Result<Head> {
        let content = fs::read_to_string(self.head_path())?;
        let content = content.trim_end();

        match content.strip_prefix("ref: ") {
            Some(name) => Ok(Head::Symbolic(name.to_owned())),
            None => content
                .parse()
                .map(Head::Detached)
                .map_err(|_| Error::InvalidOid(content.to_owned())),
        }
    }
}
