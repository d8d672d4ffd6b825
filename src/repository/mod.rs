use std::{
    fs, io,
    path::{self, Path, PathBuf},
};

use db::Db;
use object::Object;
use refs::{Head, Refs};
use tracing::{debug, info, trace};

use crate::config::ConfigFile;
use crate::error::{Error, Result};
use crate::lockfile::write_locked;
use crate::oid::Oid;

pub mod db;
pub mod object;
pub mod paths;
pub mod refs;

/// Name of the metadata directory inside a work tree.
pub const GIT_DIR: &str = ".git";

/// The only `core.repositoryformatversion` we understand.
pub const FORMAT_VERSION: &str = "0";

const DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository\n";

pub struct Repository {
    work_tree: PathBuf,
    git_dir: PathBuf,
    config: ConfigFile,
    db: Db,
    refs: Refs,
}

impl Repository {
    fn assemble(work_tree: PathBuf, config: ConfigFile) -> Self {
        let git_dir = work_tree.join(GIT_DIR);

        Self {
            db: Db::new(git_dir.clone()),
            refs: Refs::new(git_dir.clone()),
            work_tree,
            git_dir,
            config,
        }
    }

    /// Opens the repository whose work tree is `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let work_tree = path.into();
        let git_dir = work_tree.join(GIT_DIR);
        if !git_dir.is_dir() {
            return Err(Error::NotARepository(git_dir));
        }

        let config_path = git_dir.join("config");
        let text = match fs::read_to_string(&config_path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MissingConfig(config_path))
            }
            Err(e) => return Err(e.into()),
        };
        let config = ConfigFile::parse(text.lines());

        let version = config
            .get("core", "repositoryformatversion")
            .unwrap_or_default();
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedFormatVersion(version.to_owned()));
        }

        debug!(path = %work_tree.display(), "opened repository");
        Ok(Self::assemble(work_tree, config))
    }

    /// Creates a new repository in `path`, which must be missing or empty.
    pub fn init(path: impl Into<PathBuf>) -> Result<Self> {
        let work_tree = path.into();

        if work_tree.exists() {
            if !work_tree.is_dir() {
                return Err(Error::PathIsFile(work_tree));
            }
            if fs::read_dir(&work_tree)?.next().is_some() {
                return Err(Error::DirectoryNotEmpty(work_tree));
            }
        }

        let repo = Self::assemble(work_tree, ConfigFile::repository_default());

        paths::ensure_dir(&repo.git_dir.join("branches"), true)?;
        repo.db.init()?;
        repo.refs.init()?;
        write_locked(&repo.git_dir.join("description"), DESCRIPTION.as_bytes())?;
        repo.write_config()?;

        info!(path = %repo.git_dir.display(), "initialized empty repository");
        Ok(repo)
    }

    /// Walks from `start` up through its ancestors and opens the first
    /// directory that has a metadata directory.
    pub fn find_root(start: impl AsRef<Path>) -> Result<Self> {
        Self::find_root_within(start, None::<&Path>)
    }

    /// Like [`Repository::find_root`], but never looks above `ceiling`.
    ///
    /// The ceiling itself is still searched. A ceiling that is not an
    /// ancestor of `start` has no effect.
    pub fn find_root_within(
        start: impl AsRef<Path>,
        ceiling: Option<impl AsRef<Path>>,
    ) -> Result<Self> {
        let start = path::absolute(start.as_ref())?;
        let ceiling = ceiling.map(|c| path::absolute(c.as_ref())).transpose()?;

        for dir in start.ancestors() {
            if dir.join(GIT_DIR).is_dir() {
                debug!(root = %dir.display(), from = %start.display(), "found repository");
                return Self::open(dir);
            }
            if ceiling.as_deref() == Some(dir) {
                trace!(ceiling = %dir.display(), "stopping repository search");
                break;
            }
        }

        Err(Error::NoRepositoryFound(start))
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Updates one config value and rewrites `.git/config`.
    pub fn set_config(&mut self, section: &str, key: &str, value: &str) -> Result<()> {
        self.config.set(section, key, value);
        self.write_config()
    }

    fn write_config(&self) -> Result<()> {
        let path = paths::ensure_file(&self.git_dir.join("config"), true)?
            .ok_or_else(|| Error::NotADirectory(self.git_dir.clone()))?;
        write_locked(&path, self.config.serialize().as_bytes())
    }

    pub fn head(&self) -> Result<Head> {
        self.refs.head()
    }

    pub fn read_object(&self, oid: &Oid) -> Result<Object> {
        self.db.read_object(oid)
    }

    /// Returns the address of `object`, storing it when `persist` is set.
    pub fn write_object(&self, object: &Object, persist: bool) -> Result<Oid> {
        self.db.store_object(object, persist)
    }

    pub fn hash_object(&self, object: &Object) -> Oid {
        *object.encode_for_storage().oid()
    }

    /// Resolves a full or abbreviated hex object name.
    pub fn find_object(&self, name: &str) -> Result<Oid> {
        self.db.resolve(name)
    }

    pub fn object_path(&self, oid: &Oid) -> PathBuf {
        self.db.object_path(oid)
    }
}
