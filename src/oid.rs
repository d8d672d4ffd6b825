use sha1::{Digest, Sha1};
use std::fmt::{Debug, Display};
use std::str::FromStr;

use crate::error::{Error, Result};

pub const OID_SIZE: usize = 20;
pub const OID_HEX_SIZE: usize = OID_SIZE * 2;

/// Content address of a stored object: the SHA-1 of its framed bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid {
    hash: [u8; OID_SIZE],
}

impl Oid {
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        let hash = hasher.finalize();
        Self { hash: hash.into() }
    }

    pub fn from_bytes(hash: [u8; OID_SIZE]) -> Self {
        Self { hash }
    }

    pub fn as_bytes(&self) -> &[u8; OID_SIZE] {
        &self.hash
    }

    /// Splits the hex form into the objects subdirectory and file name.
    pub fn split(&self) -> (String, String) {
        let mut hex = self.to_string();
        let rest = hex.split_off(2);
        (hex, rest)
    }
}

impl Debug for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Oid({})", base16ct::lower::encode_string(&self.hash))
    }
}

impl Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", base16ct::lower::encode_string(&self.hash))
    }
}

impl From<Oid> for String {
    fn from(value: Oid) -> Self {
        value.to_string()
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != OID_HEX_SIZE {
            return Err(Error::InvalidOid(s.to_owned()));
        }
        let bytes = hex::decode(s).map_err(|_| Error::InvalidOid(s.to_owned()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for Oid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        let hash: [u8; OID_SIZE] = value
            .try_into()
            .map_err(|_| Error::InvalidOid(hex::encode(value)))?;
        Ok(Self { hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_to_lowercase_hex() {
        let oid = Oid::hash(b"blob 0\0");
        assert_eq!(oid.to_string(), "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391");
    }

    #[test]
    fn parses_hex_in_either_case() {
        let lower: Oid = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad".parse().unwrap();
        let upper: Oid = "3B18E512DBA79E4C8300DD08AEB37F8E728B8DAD".parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.to_string(), "3b18e512dba79e4c8300dd08aeb37f8e728b8dad");
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(matches!("abc".parse::<Oid>(), Err(Error::InvalidOid(_))));
        assert!(matches!(
            "zz18e512dba79e4c8300dd08aeb37f8e728b8dad".parse::<Oid>(),
            Err(Error::InvalidOid(_))
        ));
        assert!(Oid::try_from(&[0u8; 19][..]).is_err());
    }

    #[test]
    fn splits_into_directory_and_file() {
        let oid: Oid = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad".parse().unwrap();
        let (dir, file) = oid.split();
        assert_eq!(dir, "3b");
        assert_eq!(file, "18e512dba79e4c8300dd08aeb37f8e728b8dad");
    }
}
