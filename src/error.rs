use std::path::PathBuf;

/// Errors raised by the object store and the repository around it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The work tree has no metadata directory.
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    /// The metadata directory exists but has no `config` file.
    #[error("config file missing: {0}")]
    MissingConfig(PathBuf),

    /// `core.repositoryformatversion` is absent or not the supported value.
    #[error("unsupported repositoryformatversion: {0:?}")]
    UnsupportedFormatVersion(String),

    /// `init` was pointed at something that is not a directory.
    #[error("path is a file: {0}")]
    PathIsFile(PathBuf),

    /// `init` was pointed at a directory that already has entries.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    /// A path component that should be a directory is something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No stored object matches the requested name.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// An abbreviated object name matches more than one object.
    #[error("ambiguous object name: {0}")]
    AmbiguousOid(String),

    /// Text that is not a valid hex object name.
    #[error("invalid object name: {0:?}")]
    InvalidOid(String),

    /// The zlib stream is invalid, truncated, or fails its checksum.
    #[error("corrupt zlib stream: {0}")]
    CorruptStream(String),

    /// The framing header or the object content cannot be decoded.
    #[error("malformed object: {0}")]
    MalformedObject(String),

    /// The type tag is not one of blob, tree, commit, tag.
    #[error("unsupported object type: {0:?}")]
    UnsupportedType(String),

    /// Root discovery walked up to the filesystem root without a match.
    #[error("no repository found in {0} or any parent directory")]
    NoRepositoryFound(PathBuf),

    /// A tree already holds an entry with this name.
    #[error("duplicate tree entry: {0}")]
    DuplicateEntry(String),

    /// Somebody else holds `<file>.lock`.
    #[error("unable to lock {0}: lock file already exists")]
    LockHeld(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
