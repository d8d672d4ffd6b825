//! A content-addressable object store laid out like a git object database.
//!
//! Objects are framed as `<type> <len>\0<content>`, addressed by the SHA-1 of
//! that frame and stored zlib-compressed under `.git/objects`.

pub mod config;
pub mod error;
pub mod lockfile;
pub mod oid;
pub mod repository;
pub mod zlib;

pub use error::{Error, Result};
pub use oid::Oid;
pub use repository::object::{
    blob::Blob,
    commit::{Commit, Signature},
    tag::Tag,
    tree::{EntryMode, Tree, TreeEntry},
    DbObject, Object, ObjectKind,
};
pub use repository::Repository;
