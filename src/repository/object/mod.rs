use std::fmt::{self, Display};
use std::str::FromStr;

use bstr::ByteSlice;

use blob::Blob;
use commit::Commit;
use tag::Tag;
use tree::Tree;

use crate::error::{Error, Result};
use crate::oid::Oid;

pub mod blob;
pub mod commit;
mod headers;
pub mod tag;
pub mod tree;

/// Type tag written in the framing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    fn from_bytes(name: &[u8]) -> Result<Self> {
        match name {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(Error::UnsupportedType(name.to_str_lossy().into_owned())),
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(s.as_bytes())
    }
}

/// Framed object ready for storage: `<kind> <len>\0<content>` and its address.
#[derive(Debug, Clone)]
pub struct DbObject {
    data: Vec<u8>,
    oid: Oid,
}

impl DbObject {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn oid(&self) -> &Oid {
        &self.oid
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl From<&Object> for DbObject {
    fn from(value: &Object) -> Self {
        let kind = value.kind().as_str().as_bytes();
        let contents = value.to_bytes();

        let mut content: Vec<u8> = Vec::with_capacity(kind.len() + contents.len() + 24);
        content.extend_from_slice(kind);
        content.push(b' ');
        content.extend_from_slice(contents.len().to_string().as_bytes());
        content.push(0);
        content.extend_from_slice(&contents);

        let oid = Oid::hash(&content);

        Self { data: content, oid }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }

    /// Canonical content bytes, without the framing header.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Blob(blob) => blob.as_bytes().to_owned(),
            Self::Tree(tree) => tree.to_bytes(),
            Self::Commit(commit) => commit.to_bytes(),
            Self::Tag(tag) => tag.to_bytes(),
        }
    }

    pub fn decode(kind: ObjectKind, data: &[u8]) -> Result<Self> {
        Ok(match kind {
            ObjectKind::Blob => Blob::new(data.to_owned()).into(),
            ObjectKind::Tree => Tree::from_bytes(data)?.into(),
            ObjectKind::Commit => Commit::from_bytes(data)?.into(),
            ObjectKind::Tag => Tag::from_bytes(data)?.into(),
        })
    }

    /// Frames the object and computes its address.
    pub fn encode_for_storage(&self) -> DbObject {
        DbObject::from(self)
    }

    /// Parses `<kind> <len>\0<content>` and decodes the content.
    pub fn decode_from_storage(framed: &[u8]) -> Result<Self> {
        let kind_end = framed
            .find_byte(b' ')
            .ok_or_else(|| malformed("missing space after object type"))?;
        let size_end = framed[kind_end..]
            .find_byte(0)
            .map(|offset| kind_end + offset)
            .ok_or_else(|| malformed("missing NUL after object size"))?;

        let size_field = &framed[kind_end + 1..size_end];
        let leading_zero = size_field.len() > 1 && size_field[0] == b'0';
        if size_field.is_empty() || leading_zero || !size_field.iter().all(u8::is_ascii_digit) {
            return Err(malformed(format!(
                "bad object size {:?}",
                size_field.as_bstr()
            )));
        }
        let size: usize = size_field
            .to_str()
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(format!("object size {:?} out of range", size_field.as_bstr())))?;

        let content = &framed[size_end + 1..];
        if content.len() != size {
            return Err(malformed(format!(
                "bad length: header says {size}, content has {}",
                content.len()
            )));
        }

        let kind = ObjectKind::from_bytes(&framed[..kind_end])?;
        Self::decode(kind, content)
    }
}

pub(crate) fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedObject(reason.into())
}

impl From<Blob> for Object {
    fn from(value: Blob) -> Self {
        Self::Blob(value)
    }
}

impl From<Tree> for Object {
    fn from(value: Tree) -> Self {
        Self::Tree(value)
    }
}

impl From<Commit> for Object {
    fn from(value: Commit) -> Self {
        Self::Commit(value)
    }
}

impl From<Tag> for Object {
    fn from(value: Tag) -> Self {
        Self::Tag(value)
    }
}
