//! Decoder for `ResStringPool` chunks.

use super::chunk::{ChunkReader, RES_STRING_POOL_TYPE};
use super::InspectResult;

/// Flag marking a pool whose strings are UTF-8 rather than UTF-16.
const UTF8_FLAG: u32 = 1 << 8;

/// Index value meaning "no string".
pub(crate) const NO_STRING: u32 = u32::MAX;

/// A decoded string pool.
#[derive(Debug, Clone, Default)]
pub(crate) struct StringPool {
    strings: Vec<String>,
}

impl StringPool {
    /// Decode the string pool chunk starting at `offset`.
    pub fn parse(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<Self> {
        let header = reader.header(offset)?;
        if header.kind != RES_STRING_POOL_TYPE {
            return Err(reader.malformed(format!(
                "expected string pool at {}, found chunk 0x{:04x}",
                offset, header.kind
            )));
        }

        let count = reader.u32(offset + 8)? as usize;
        let flags = reader.u32(offset + 16)?;
        let strings_start = offset + reader.u32(offset + 20)? as usize;
        let chunk_end = header.end(offset);
        let index_start = header.body(offset);

        let index_fits = count
            .checked_mul(4)
            .is_some_and(|len| index_start + len <= chunk_end);
        if !index_fits {
            return Err(reader.malformed(format!("{} string offsets overflow pool", count)));
        }

        let utf8 = flags & UTF8_FLAG != 0;
        let mut strings = Vec::with_capacity(count);
        for i in 0..count {
            let string_offset = strings_start + reader.u32(index_start + i * 4)? as usize;
            if string_offset >= chunk_end {
                return Err(reader.malformed(format!("string {} starts outside pool", i)));
            }
            let value = if utf8 {
                decode_utf8(reader, string_offset)?
            } else {
                decode_utf16(reader, string_offset)?
            };
            strings.push(value);
        }

        Ok(Self { strings })
    }

    /// Look up a string by index. Returns `None` for [`NO_STRING`] or an
    /// out-of-range index.
    pub fn get(&self, index: u32) -> Option<&str> {
        if index == NO_STRING {
            return None;
        }
        self.strings.get(index as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }
}

/// UTF-8 lengths use one byte, or two when the high bit is set.
fn read_len8(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<(usize, usize)> {
    let first = reader.u8(offset)? as usize;
    if first & 0x80 != 0 {
        let second = reader.u8(offset + 1)? as usize;
        Ok((((first & 0x7f) << 8) | second, 2))
    } else {
        Ok((first, 1))
    }
}

/// UTF-16 lengths use one unit, or two when the high bit is set.
fn read_len16(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<(usize, usize)> {
    let first = reader.u16(offset)? as usize;
    if first & 0x8000 != 0 {
        let second = reader.u16(offset + 2)? as usize;
        Ok((((first & 0x7fff) << 16) | second, 4))
    } else {
        Ok((first, 2))
    }
}

fn decode_utf8(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<String> {
    // Character count first, then the encoded byte count.
    let (_, skip) = read_len8(reader, offset)?;
    let (byte_len, len_size) = read_len8(reader, offset + skip)?;
    let bytes = reader.slice(offset + skip + len_size, byte_len)?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn decode_utf16(reader: &ChunkReader<'_>, offset: usize) -> InspectResult<String> {
    let (unit_len, len_size) = read_len16(reader, offset)?;
    let byte_len = unit_len
        .checked_mul(2)
        .ok_or_else(|| reader.malformed("UTF-16 string length overflow"))?;
    let bytes = reader.slice(offset + len_size, byte_len)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
