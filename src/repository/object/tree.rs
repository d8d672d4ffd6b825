use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::{self, Display};

use bstr::{BString, ByteSlice};

use crate::error::{Error, Result};
use crate::oid::{Oid, OID_SIZE};

use super::malformed;

/// File mode of a tree entry, written in octal without leading zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryMode(u32);

impl EntryMode {
    pub const REGULAR: Self = Self(0o100644);
    pub const EXECUTABLE: Self = Self(0o100755);
    pub const SYMLINK: Self = Self(0o120000);
    pub const GITLINK: Self = Self(0o160000);
    pub const DIRECTORY: Self = Self(0o040000);

    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_tree(&self) -> bool {
        *self == Self::DIRECTORY
    }

    fn parse(field: &[u8]) -> Result<Self> {
        field
            .to_str()
            .ok()
            .filter(|s| !s.is_empty())
            .and_then(|s| u32::from_str_radix(s, 8).ok())
            .map(Self)
            .ok_or_else(|| malformed(format!("bad tree entry mode {:?}", field.as_bstr())))
    }
}

impl Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    pub name: BString,
    pub oid: Oid,
}

impl TreeEntry {
    /// Git order: subtrees sort as if their name ended with `/`.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        let suffix = |entry: &Self| entry.mode.is_tree().then_some(b'/');
        self.name
            .iter()
            .copied()
            .chain(suffix(self))
            .cmp(other.name.iter().copied().chain(suffix(other)))
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.mode.to_string().as_bytes());
        out.push(b' ');
        out.extend_from_slice(&self.name);
        out.push(0);
        out.extend_from_slice(self.oid.as_bytes());
    }
}

/// Directory snapshot. Entries are kept sorted and names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, mode: EntryMode, name: impl Into<BString>, oid: Oid) -> Result<()> {
        let name = name.into();
        validate_name(&name)?;
        if self.entries.iter().any(|e| e.name == name) {
            return Err(Error::DuplicateEntry(name.to_string()));
        }

        let entry = TreeEntry { mode, name, oid };
        let at = self
            .entries
            .partition_point(|e| e.sort_cmp(&entry) == Ordering::Less);
        self.entries.insert(at, entry);
        Ok(())
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn get(&self, name: &[u8]) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name.as_slice() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            entry.serialize(&mut out);
        }
        out
    }

    /// Decodes stored entries, which must already be in git order.
    pub fn from_bytes(mut data: &[u8]) -> Result<Self> {
        let mut entries: Vec<TreeEntry> = Vec::new();
        let mut seen = HashSet::new();

        while !data.is_empty() {
            let mode_end = data
                .find_byte(b' ')
                .ok_or_else(|| malformed("tree entry without mode"))?;
            let mode = EntryMode::parse(&data[..mode_end])?;

            let name_end = data[mode_end..]
                .find_byte(0)
                .map(|offset| mode_end + offset)
                .ok_or_else(|| malformed("tree entry name is not NUL terminated"))?;
            let name = &data[mode_end + 1..name_end];
            validate_name(name)?;

            let oid_end = name_end + 1 + OID_SIZE;
            if data.len() < oid_end {
                return Err(malformed("tree entry truncated in object id"));
            }
            let oid = Oid::try_from(&data[name_end + 1..oid_end])?;

            // A file and a directory with the same name need not be adjacent.
            if !seen.insert(name) {
                return Err(malformed(format!("duplicate tree entry {:?}", name.as_bstr())));
            }

            let entry = TreeEntry {
                mode,
                name: name.into(),
                oid,
            };
            if let Some(previous) = entries.last() {
                if previous.sort_cmp(&entry) != Ordering::Less {
                    return Err(malformed(format!(
                        "tree entry {:?} out of order after {:?}",
                        entry.name, previous.name
                    )));
                }
            }
            entries.push(entry);
            data = &data[oid_end..];
        }

        Ok(Self { entries })
    }
}

fn validate_name(name: &[u8]) -> Result<()> {
    if name.is_empty() || name.contains(&b'/') || name.contains(&0) {
        return Err(malformed(format!("invalid tree entry name {:?}", name.as_bstr())));
    }
    Ok(())
}
