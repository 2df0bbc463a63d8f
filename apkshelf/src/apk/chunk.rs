//! Bounds-checked reader for Android binary resource chunks.
//!
//! Both the compiled manifest (`AndroidManifest.xml`) and the resource table
//! (`resources.arsc`) are sequences of little-endian chunks. Every chunk
//! starts with the same 8-byte header:
//!
//! ```text
//! u16 type | u16 header_size | u32 size
//! ```
//!
//! All reads go through [`ChunkReader`] so that truncated input surfaces as
//! [`InspectError::Malformed`] instead of a panic.

use super::{InspectError, InspectResult};

pub(crate) const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub(crate) const RES_TABLE_TYPE: u16 = 0x0002;
pub(crate) const RES_XML_TYPE: u16 = 0x0003;
pub(crate) const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub(crate) const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub(crate) const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;
pub(crate) const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub(crate) const RES_TABLE_TYPE_TYPE: u16 = 0x0201;

/// Size of the common chunk header.
pub(crate) const CHUNK_HEADER_SIZE: usize = 8;

/// The header shared by every resource chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkHeader {
    pub kind: u16,
    pub header_size: u16,
    pub size: u32,
}

impl ChunkHeader {
    /// Offset one past the end of the chunk starting at `offset`.
    pub fn end(&self, offset: usize) -> usize {
        offset + self.size as usize
    }

    /// Offset of the chunk body (after its header).
    pub fn body(&self, offset: usize) -> usize {
        offset + self.header_size as usize
    }
}

/// Little-endian reader over a byte slice.
#[derive(Clone, Copy)]
pub(crate) struct ChunkReader<'a> {
    data: &'a [u8],
    what: &'static str,
}

impl<'a> ChunkReader<'a> {
    /// Create a reader. `what` names the structure in error messages.
    pub fn new(data: &'a [u8], what: &'static str) -> Self {
        Self { data, what }
    }

    pub fn malformed(&self, reason: impl Into<String>) -> InspectError {
        InspectError::Malformed {
            what: self.what,
            reason: reason.into(),
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> InspectResult<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                self.malformed(format!(
                    "read of {} bytes at offset {} exceeds {} bytes",
                    len,
                    offset,
                    self.data.len()
                ))
            })
    }

    pub fn u8(&self, offset: usize) -> InspectResult<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn u16(&self, offset: usize) -> InspectResult<u16> {
        let bytes = self.slice(offset, 2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn u32(&self, offset: usize) -> InspectResult<u32> {
        let bytes = self.slice(offset, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read and sanity-check the chunk header at `offset`.
    ///
    /// The chunk must be at least as large as its header, the header must be
    /// at least 8 bytes, and the whole chunk must fit in the buffer.
    pub fn header(&self, offset: usize) -> InspectResult<ChunkHeader> {
        let header = ChunkHeader {
            kind: self.u16(offset)?,
            header_size: self.u16(offset + 2)?,
            size: self.u32(offset + 4)?,
        };

        if (header.header_size as usize) < CHUNK_HEADER_SIZE {
            return Err(self.malformed(format!(
                "chunk 0x{:04x} at {} has header size {}",
                header.kind, offset, header.header_size
            )));
        }
        if header.size < header.header_size as u32 {
            return Err(self.malformed(format!(
                "chunk 0x{:04x} at {} is smaller than its header",
                header.kind, offset
            )));
        }
        if header.end(offset) > self.data.len() {
            return Err(self.malformed(format!(
                "chunk 0x{:04x} at {} runs past end of data",
                header.kind, offset
            )));
        }

        Ok(header)
    }

    /// Collect the headers of consecutive chunks in `start..end`.
    pub fn chunks(&self, start: usize, end: usize) -> InspectResult<Vec<(usize, ChunkHeader)>> {
        let mut chunks = Vec::new();
        let mut offset = start;
        while offset + CHUNK_HEADER_SIZE <= end {
            let header = self.header(offset)?;
            if header.end(offset) > end {
                return Err(self.malformed(format!(
                    "chunk 0x{:04x} at {} overruns its parent",
                    header.kind, offset
                )));
            }
            chunks.push((offset, header));
            offset = header.end(offset);
        }
        Ok(chunks)
    }
}
