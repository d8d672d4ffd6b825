//! zlib framing (RFC 1950) around raw deflate, as used for every stored object.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use tracing::warn;

use crate::error::{Error, Result};

const CHUNK_SIZE: usize = 8 * 1024;

pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflates a complete zlib stream.
///
/// The header, every deflate block and the Adler-32 trailer are checked;
/// any failure, including a stream that ends early, is a `CorruptStream`.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).max(CHUNK_SIZE));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(CHUNK_SIZE));
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = before_in as usize;

        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| Error::CorruptStream(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled {
                    return Err(Error::CorruptStream(format!(
                        "stream ended after {} of {} bytes without a trailer",
                        inflater.total_in(),
                        data.len()
                    )));
                }
            }
        }
    }

    let trailing = data.len() - inflater.total_in() as usize;
    if trailing > 0 {
        warn!(trailing, "ignoring bytes after end of zlib stream");
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // zlib.compress(b"hello") from the reference implementation.
    const HELLO_ZLIB: [u8; 13] = [
        0x78, 0x9c, 0xcb, 0x48, 0xcd, 0xc9, 0xc9, 0x07, 0x00, 0x06, 0x2c, 0x02, 0x15,
    ];

    #[test]
    fn reads_reference_stream() {
        assert_eq!(decompress(&HELLO_ZLIB).unwrap(), b"hello");
    }

    #[test]
    fn writes_zlib_header_and_adler_trailer() {
        let compressed = compress(b"hello").unwrap();
        assert_eq!(compressed[0], 0x78);
        assert_eq!((u16::from(compressed[0]) << 8 | u16::from(compressed[1])) % 31, 0);
        assert_eq!(&compressed[compressed.len() - 4..], &[0x06, 0x2c, 0x02, 0x15]);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let mut compressed = compress(b"hello world").unwrap();
        let last = compressed.len() - 1;
        compressed[last] ^= 0xff;
        assert!(matches!(decompress(&compressed), Err(Error::CorruptStream(_))));
    }

    #[test]
    fn rejects_bad_header() {
        let mut compressed = HELLO_ZLIB;
        compressed[0] = 0x00;
        assert!(matches!(decompress(&compressed), Err(Error::CorruptStream(_))));
    }

    #[test]
    fn rejects_truncated_and_empty_input() {
        assert!(matches!(decompress(&HELLO_ZLIB[..8]), Err(Error::CorruptStream(_))));
        assert!(matches!(decompress(&[]), Err(Error::CorruptStream(_))));
    }

    #[test]
    fn handles_large_input() {
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        assert_eq!(decompress(&compress(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn inflates_far_past_first_chunk() {
        // Highly repetitive input: back-references span many output chunks.
        let data = b"fn main() { println!(\"hello\"); }\n".repeat(10_000);
        let compressed = compress(&data).unwrap();
        assert!(compressed.len() * 2 < CHUNK_SIZE);
        assert_eq!(decompress(&compressed).unwrap(), data);
    }

    proptest! {
        #[test]
        fn compress_round_trips(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            prop_assert_eq!(decompress(&compress(&data).unwrap()).unwrap(), data);
        }

        #[test]
        fn compressible_round_trips(
            unit in proptest::collection::vec(any::<u8>(), 1..64),
            repeats in 1usize..4096,
        ) {
            let data = unit.repeat(repeats);
            prop_assert_eq!(decompress(&compress(&data).unwrap()).unwrap(), data);
        }
    }
}
