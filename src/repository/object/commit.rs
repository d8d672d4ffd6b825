use std::fmt::{self, Display};
use std::str::FromStr;

use bstr::{BStr, BString, ByteSlice};
use chrono::{DateTime, FixedOffset, TimeZone};

use crate::error::{Error, Result};
use crate::oid::Oid;

use super::{headers, malformed};

/// Identity and timestamp, as in `author` / `committer` / `tagger` lines.
///
/// The line is kept as read so that re-encoding reproduces it exactly,
/// including a `-0000` offset or irregular spacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: BString,
    email: BString,
    time: DateTime<FixedOffset>,
    raw: BString,
}

impl Signature {
    pub fn new<Tz: TimeZone>(name: String, email: String, time: DateTime<Tz>) -> Self {
        let time = time.fixed_offset();
        let raw = format!(
            "{} <{}> {} {}",
            name,
            email,
            time.timestamp(),
            time.format("%z")
        );

        Self {
            name: name.into(),
            email: email.into(),
            time,
            raw: raw.into(),
        }
    }

    pub fn parse(raw: &[u8]) -> Result<Self> {
        let bad = || malformed(format!("bad signature {:?}", raw.as_bstr()));

        let email_end = raw.rfind_byte(b'>').ok_or_else(bad)?;
        let email_start = raw[..email_end].find_byte(b'<').ok_or_else(bad)?;
        let when = raw[email_end + 1..].to_str().map_err(|_| bad())?;

        let (seconds, offset) = when.trim_start().split_once(' ').ok_or_else(bad)?;
        let seconds: i64 = seconds.parse().map_err(|_| bad())?;
        let offset = parse_offset(offset).ok_or_else(bad)?;
        let time = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(bad)?
            .with_timezone(&offset);

        Ok(Self {
            name: raw[..email_start].trim_end().into(),
            email: raw[email_start + 1..email_end].into(),
            time,
            raw: raw.into(),
        })
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    pub fn email(&self) -> &BStr {
        self.email.as_bstr()
    }

    pub fn time(&self) -> &DateTime<FixedOffset> {
        &self.time
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.raw.as_bstr(), f)
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s.as_bytes())
    }
}

/// `+HHMM` / `-HHMM`.
fn parse_offset(field: &str) -> Option<FixedOffset> {
    let (sign, digits) = match field.as_bytes().first()? {
        b'+' => (1, &field[1..]),
        b'-' => (-1, &field[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    tree: Oid,
    parents: Vec<Oid>,
    author: Signature,
    committer: Signature,
    extra_headers: Vec<(BString, BString)>,
    message: BString,
}

impl Commit {
    pub fn new(
        tree: Oid,
        parents: Vec<Oid>,
        author: Signature,
        committer: Signature,
        message: impl Into<BString>,
    ) -> Self {
        Self {
            tree,
            parents,
            author,
            committer,
            extra_headers: Vec::new(),
            message: message.into(),
        }
    }

    pub fn tree(&self) -> &Oid {
        &self.tree
    }

    pub fn parents(&self) -> &[Oid] {
        &self.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    /// Headers other than tree/parent/author/committer, e.g. `gpgsig`.
    pub fn extra_headers(&self) -> &[(BString, BString)] {
        &self.extra_headers
    }

    pub fn message(&self) -> &BStr {
        self.message.as_bstr()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let tree = self.tree.to_string();
        let parents: Vec<String> = self.parents.iter().map(Oid::to_string).collect();

        let known = std::iter::once((&b"tree"[..], tree.as_bytes()))
            .chain(parents.iter().map(|p| (&b"parent"[..], p.as_bytes())))
            .chain([
                (&b"author"[..], self.author.as_bytes()),
                (&b"committer"[..], self.committer.as_bytes()),
            ]);
        let extra = self
            .extra_headers
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()));

        headers::write(known.chain(extra), &self.message)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (headers, message) = headers::parse(data)?;

        let mut tree = None;
        let mut parents = Vec::new();
        let mut author = None;
        let mut committer = None;
        let mut extra_headers = Vec::new();

        for (key, value) in headers {
            match key.as_slice() {
                b"tree" if tree.is_none() => tree = Some(parse_oid(&key, &value)?),
                b"parent" => parents.push(parse_oid(&key, &value)?),
                b"author" if author.is_none() => author = Some(Signature::parse(&value)?),
                b"committer" if committer.is_none() => {
                    committer = Some(Signature::parse(&value)?)
                }
                b"tree" | b"author" | b"committer" => {
                    return Err(malformed(format!("commit has more than one {key} header")))
                }
                _ => extra_headers.push((key, value)),
            }
        }

        Ok(Self {
            tree: tree.ok_or_else(|| malformed("commit without tree"))?,
            parents,
            author: author.ok_or_else(|| malformed("commit without author"))?,
            committer: committer.ok_or_else(|| malformed("commit without committer"))?,
            extra_headers,
            message,
        })
    }
}

pub(crate) fn parse_oid(key: &[u8], value: &[u8]) -> Result<Oid> {
    headers::text(key, value)?
        .parse()
        .map_err(|e: Error| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
        parent 3b18e512dba79e4c8300dd08aeb37f8e728b8dad\n\
        author A U Thor <author@example.com> 1112911993 -0700\n\
        committer C O Mitter <committer@example.com> 1112912053 +0530\n\
        gpgsig -----BEGIN PGP SIGNATURE-----\n \n abc\n -----END PGP SIGNATURE-----\n\
        \n\
        Initial revision\n";

    #[test]
    fn decodes_and_reencodes_byte_identical() {
        let commit = Commit::from_bytes(RAW.as_bytes()).unwrap();

        assert_eq!(
            commit.tree().to_string(),
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904"
        );
        assert_eq!(commit.parents().len(), 1);
        assert_eq!(commit.author().name(), "A U Thor");
        assert_eq!(commit.author().email(), "author@example.com");
        assert_eq!(commit.author().time().timestamp(), 1112911993);
        assert_eq!(commit.committer().time().offset().local_minus_utc(), 19800);
        assert_eq!(commit.extra_headers()[0].0, "gpgsig");
        assert_eq!(commit.message(), "Initial revision\n");

        assert_eq!(commit.to_bytes(), RAW.as_bytes());
    }

    #[test]
    fn keeps_legacy_encoded_commits_intact() {
        let raw: &[u8] = b"tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
            author Jos\xe9 <jose@example.com> 1112911993 +0100\n\
            committer Jos\xe9 <jose@example.com> 1112911993 +0100\n\
            encoding ISO-8859-1\n\
            \n\
            caf\xe9\n";

        let commit = Commit::from_bytes(raw).unwrap();
        assert_eq!(commit.author().name(), &b"Jos\xe9"[..]);
        assert_eq!(commit.extra_headers()[0].1, "ISO-8859-1");
        assert_eq!(commit.message(), &b"caf\xe9\n"[..]);
        assert_eq!(commit.to_bytes(), raw);
    }

    #[test]
    fn root_commit_has_no_parents() {
        let tree: Oid = "4b825dc642cb6eb9a060e54bf8d69288fbee4904".parse().unwrap();
        let when = FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(1_700_000_000, 0)
            .unwrap();
        let sig = Signature::new("Jo".to_owned(), "jo@example.com".to_owned(), when);
        let commit = Commit::new(tree, Vec::new(), sig.clone(), sig, "first\n");

        assert!(commit.is_root());
        assert_eq!(
            String::from_utf8(commit.to_bytes()).unwrap(),
            "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
             author Jo <jo@example.com> 1700000000 +0100\n\
             committer Jo <jo@example.com> 1700000000 +0100\n\
             \n\
             first\n"
        );
        assert_eq!(Commit::from_bytes(&commit.to_bytes()).unwrap(), commit);
    }

    #[test]
    fn requires_tree_and_identities() {
        let no_tree = "author a <a> 0 +0000\ncommitter a <a> 0 +0000\n\nmsg";
        let no_author = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\ncommitter a <a> 0 +0000\n\nmsg";
        let two_trees = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
            tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
            author a <a> 0 +0000\ncommitter a <a> 0 +0000\n\nmsg";
        let bad_parent = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\nparent xyz\n\
            author a <a> 0 +0000\ncommitter a <a> 0 +0000\n\nmsg";

        for raw in [no_tree, no_author, two_trees, bad_parent] {
            assert!(matches!(
                Commit::from_bytes(raw.as_bytes()),
                Err(Error::MalformedObject(_))
            ));
        }
    }

    #[test]
    fn parses_signatures() {
        let sig: Signature = "Name With Spaces <n@x> 0 -0130".parse().unwrap();
        assert_eq!(sig.name(), "Name With Spaces");
        assert_eq!(sig.time().offset().local_minus_utc(), -5400);
        assert_eq!(sig.to_string(), "Name With Spaces <n@x> 0 -0130");

        for bad in ["no email 0 +0000", "a <b> x +0000", "a <b> 0 0000", "a <b> 0"] {
            assert!(bad.parse::<Signature>().is_err(), "{bad}");
        }
    }

    #[test]
    fn signatures_reencode_exactly() {
        for raw in [
            "<a@b> 0 +0000",
            "A  <a@b> 0 +0000",
            "A <a@b> 0 -0000",
            "A <a@b>  1700000000 +0100",
        ] {
            let sig: Signature = raw.parse().unwrap();
            assert_eq!(sig.as_bytes(), raw.as_bytes());
            assert_eq!(sig.to_string(), raw);
        }

        let sig: Signature = "A  <a@b> 0 -0000".parse().unwrap();
        assert_eq!(sig.name(), "A");
        assert_eq!(sig.time().offset().local_minus_utc(), 0);
    }
}
