//! Unsigned varint framing
//!
//! Integers are written 7 bits at a time, least significant group first, with
//! the high bit of every byte except the last set.
//!
//! Encoding always produces the minimal form. Decoding also accepts longer
//! forms such as `0x92 0x00` for 18, which other encoders are allowed to emit.
//! `unsigned_varint::decode` rejects those, so decoding lives here.
//!
//! See: <https://github.com/multiformats/unsigned-varint>

use std::io::{self, Read, Write};

use crate::EncodingError;

/// Longest encoding accepted for a `u64`
pub const MAX_LEN: usize = 10;

/// Encode `value` in its minimal form
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut buffer = unsigned_varint::encode::u64_buffer();
    unsigned_varint::encode::u64(value, &mut buffer).to_vec()
}

/// Write the minimal encoding of `value` to `writer`
pub fn write_u64<W: Write + ?Sized>(value: u64, writer: &mut W) -> io::Result<()> {
    let mut buffer = unsigned_varint::encode::u64_buffer();
    writer.write_all(unsigned_varint::encode::u64(value, &mut buffer))
}

/// Number of bytes in the minimal encoding of `value`
pub fn encoded_len(value: u64) -> usize {
    let mut buffer = unsigned_varint::encode::u64_buffer();
    unsigned_varint::encode::u64(value, &mut buffer).len()
}

/// Decode a varint from the front of `bytes`
///
/// Returns the value and the bytes that follow it.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, &[u8]), EncodingError> {
    let mut acc = Accumulator::default();
    for (i, byte) in bytes.iter().enumerate() {
        if acc.push(*byte)? {
            return Ok((acc.value, &bytes[i + 1..]));
        }
    }
    Err(EncodingError::VarintTruncated)
}

/// Read a varint from `reader`, one byte at a time
///
/// Fails with [`EncodingError::VarintTruncated`] if the reader runs dry,
/// including before the first byte.
pub fn read_u64<R: Read + ?Sized>(reader: &mut R) -> Result<u64, EncodingError> {
    try_read_u64(reader)?.ok_or(EncodingError::VarintTruncated)
}

/// Read a varint from `reader`, or `None` if the reader is already exhausted
///
/// Running dry after the first byte is still an error.
pub fn try_read_u64<R: Read + ?Sized>(reader: &mut R) -> Result<Option<u64>, EncodingError> {
    let mut acc = Accumulator::default();
    let Some(first) = read_byte(reader)? else {
        return Ok(None);
    };
    if acc.push(first)? {
        return Ok(Some(acc.value));
    }
    while let Some(byte) = read_byte(reader)? {
        if acc.push(byte)? {
            return Ok(Some(acc.value));
        }
    }
    Err(EncodingError::VarintTruncated)
}

fn read_byte<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

#[derive(Default)]
struct Accumulator {
    value: u64,
    count: usize,
}

impl Accumulator {
    /// Adds the next byte, returning true once the final byte has been seen
    fn push(&mut self, byte: u8) -> Result<bool, EncodingError> {
        if self.count >= MAX_LEN {
            return Err(EncodingError::VarintOverflow);
        }
        let bits = u64::from(byte & 0x7f);
        let shift = 7 * self.count as u32;
        // Only one bit of the tenth group fits in a u64
        if shift == 63 && bits > 1 {
            return Err(EncodingError::VarintOverflow);
        }
        self.value |= bits << shift;
        self.count += 1;
        Ok(byte & 0x80 == 0)
    }
}
