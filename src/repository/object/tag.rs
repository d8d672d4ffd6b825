use bstr::{BStr, BString, ByteSlice};

use crate::error::Result;
use crate::oid::Oid;

use super::commit::{parse_oid, Signature};
use super::{headers, malformed, ObjectKind};

/// Annotated tag: points at another object and records who tagged it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    object: Oid,
    kind: ObjectKind,
    name: BString,
    tagger: Signature,
    extra_headers: Vec<(BString, BString)>,
    message: BString,
}

impl Tag {
    pub fn new(
        object: Oid,
        kind: ObjectKind,
        name: impl Into<BString>,
        tagger: Signature,
        message: impl Into<BString>,
    ) -> Self {
        Self {
            object,
            kind,
            name: name.into(),
            tagger,
            extra_headers: Vec::new(),
            message: message.into(),
        }
    }

    pub fn object(&self) -> &Oid {
        &self.object
    }

    pub fn target_kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> &BStr {
        self.name.as_bstr()
    }

    pub fn tagger(&self) -> &Signature {
        &self.tagger
    }

    pub fn extra_headers(&self) -> &[(BString, BString)] {
        &self.extra_headers
    }

    pub fn message(&self) -> &BStr {
        self.message.as_bstr()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let object = self.object.to_string();

        let known = [
            (&b"object"[..], object.as_bytes()),
            (&b"type"[..], self.kind.as_str().as_bytes()),
            (&b"tag"[..], self.name.as_slice()),
            (&b"tagger"[..], self.tagger.as_bytes()),
        ];
        let extra = self
            .extra_headers
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()));

        headers::write(known.into_iter().chain(extra), &self.message)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (headers, message) = headers::parse(data)?;

        let mut object = None;
        let mut kind = None;
        let mut name = None;
        let mut tagger = None;
        let mut extra_headers = Vec::new();

        for (key, value) in headers {
            match key.as_slice() {
                b"object" if object.is_none() => object = Some(parse_oid(&key, &value)?),
                b"type" if kind.is_none() => {
                    let text = headers::text(&key, &value)?;
                    kind = Some(text.parse::<ObjectKind>().map_err(|e| malformed(e.to_string()))?)
                }
                b"tag" if name.is_none() => name = Some(value),
                b"tagger" if tagger.is_none() => tagger = Some(Signature::parse(&value)?),
                b"object" | b"type" | b"tag" | b"tagger" => {
                    return Err(malformed(format!("tag has more than one {key} header")))
                }
                _ => extra_headers.push((key, value)),
            }
        }

        Ok(Self {
            object: object.ok_or_else(|| malformed("tag without object"))?,
            kind: kind.ok_or_else(|| malformed("tag without type"))?,
            name: name.ok_or_else(|| malformed("tag without name"))?,
            tagger: tagger.ok_or_else(|| malformed("tag without tagger"))?,
            extra_headers,
            message,
        })
    }
}
