//! Wire-level helpers shared by every protocol layer
//!
//! Big-endian field access with bounds checks, the internet checksum
//! (RFC 1071) and a hexdump used by trace logging.

use std::fmt::Write;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{NetError, Result};

fn window<'a>(data: &'a [u8], offset: usize, len: usize, layer: &'static str) -> Result<&'a [u8]> {
    data.get(offset..offset + len)
        .ok_or_else(|| NetError::truncated(layer, offset + len, data.len()))
}

/// Read a big-endian `u16` at `offset`.
pub fn read_u16(data: &[u8], offset: usize, layer: &'static str) -> Result<u16> {
    Ok(BigEndian::read_u16(window(data, offset, 2, layer)?))
}

/// Read a big-endian `u32` at `offset`.
pub fn read_u32(data: &[u8], offset: usize, layer: &'static str) -> Result<u32> {
    Ok(BigEndian::read_u32(window(data, offset, 4, layer)?))
}

/// Copy a fixed-size field starting at `offset`.
pub fn read_array<const N: usize>(
    data: &[u8],
    offset: usize,
    layer: &'static str,
) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(window(data, offset, N, layer)?);
    Ok(out)
}

/// Fail with `TruncatedHeader` unless `data` holds at least `needed` bytes.
pub fn ensure_len(data: &[u8], needed: usize, layer: &'static str) -> Result<()> {
    if data.len() < needed {
        return Err(NetError::truncated(layer, needed, data.len()));
    }
    Ok(())
}

pub fn write_u16(buf: &mut Vec<u8>, value: u16) {
    let mut bytes = [0u8; 2];
    BigEndian::write_u16(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

pub fn write_u32(buf: &mut Vec<u8>, value: u32) {
    let mut bytes = [0u8; 4];
    BigEndian::write_u32(&mut bytes, value);
    buf.extend_from_slice(&bytes);
}

/// Calculate Internet checksum
///
/// Sums the data as 16-bit big-endian words, folds the carries back in and
/// returns the one's complement. A trailing odd byte is the high byte of a
/// final zero-padded word.
///
/// Run over a region whose checksum field is correctly filled in, the
/// result is zero.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum = 0u32;

    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += BigEndian::read_u16(chunk) as u32;
    }
    if let [last] = chunks.remainder() {
        sum += (*last as u32) << 8;
    }

    while (sum >> 16) > 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }

    !sum as u16
}

/// Checksum over the first `len` bytes of `data`.
pub fn checksum_prefix(data: &[u8], len: usize, layer: &'static str) -> Result<u16> {
    Ok(checksum(window(data, 0, len, layer)?))
}

/// Render bytes as hex, eight per line.
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3 + data.len() / 8);
    for (idx, byte) in data.iter().enumerate() {
        if idx > 0 && idx % 8 == 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:02x} ", byte);
    }
    out
}
