//! Header list followed by a free-text message, shared by commits and tags.
//!
//! ```text
//! key value\n
//! key first line\n
//!  continuation line\n
//! \n
//! message
//! ```
//!
//! Values and the message are raw bytes: an `encoding` header may declare
//! a legacy charset.

use bstr::{BString, ByteSlice};

use crate::error::Result;

use super::malformed;

pub(crate) type Headers = Vec<(BString, BString)>;

pub(crate) fn parse(data: &[u8]) -> Result<(Headers, BString)> {
    let mut headers: Headers = Vec::new();
    let mut rest = data;

    loop {
        let line_end = rest
            .find_byte(b'\n')
            .ok_or_else(|| malformed("header block is not terminated by a blank line"))?;
        let line = &rest[..line_end];
        rest = &rest[line_end + 1..];

        if line.is_empty() {
            return Ok((headers, BString::from(rest)));
        }

        if let Some(continuation) = line.strip_prefix(b" ") {
            let (_, value) = headers
                .last_mut()
                .ok_or_else(|| malformed("continuation line before any header"))?;
            value.push(b'\n');
            value.extend_from_slice(continuation);
            continue;
        }

        let space = line.find_byte(b' ').ok_or_else(|| {
            malformed(format!("header line without value: {:?}", line.as_bstr()))
        })?;
        headers.push((BString::from(&line[..space]), BString::from(&line[space + 1..])));
    }
}

pub(crate) fn write<'a>(
    headers: impl IntoIterator<Item = (&'a [u8], &'a [u8])>,
    message: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    for (key, value) in headers {
        out.extend_from_slice(key);
        out.push(b' ');
        out.extend_from_slice(&value.replace(b"\n", b"\n "));
        out.push(b'\n');
    }
    out.push(b'\n');
    out.extend_from_slice(message);
    out
}

/// A header value that must be text, such as an object id.
pub(crate) fn text<'a>(key: &[u8], value: &'a [u8]) -> Result<&'a str> {
    value
        .to_str()
        .map_err(|_| malformed(format!("{} header is not UTF-8", key.as_bstr())))
}
