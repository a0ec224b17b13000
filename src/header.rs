//! The fixed 8-byte container header.
//!
//! ```text
//! offset 0, length 8: index size in bytes, u64 little-endian
//! ```
//!
//! The header carries no magic and no version; its only job is to say how
//! many bytes of index records follow it.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{HeaderFault, PlankError};

/// Size of the header region in bytes.
pub const HEADER_SIZE: usize = 8;
/// Size of one `(start, end)` index record in bytes.
pub const RECORD_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    index_size: u64,
}

impl Header {
    /// Header for an index of `count` records.
    ///
    /// Fails with `EncodeOverflow` if the index alone, plus the header in
    /// front of it, does not fit in the 64-bit offset space.
    pub fn for_records(count: usize) -> Result<Self, PlankError> {
        let overflow = || PlankError::EncodeOverflow { blobs: count };
        let index_size = u64::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(RECORD_SIZE as u64))
            .ok_or_else(overflow)?;
        index_size
            .checked_add(HEADER_SIZE as u64)
            .ok_or_else(overflow)?;
        Ok(Self { index_size })
    }

    /// Read and validate the header at the front of `buf`.
    ///
    /// Checks that the buffer holds at least the header, that the declared
    /// index size is a whole number of records, and that the index fits.
    pub fn parse(buf: &[u8]) -> Result<Self, HeaderFault> {
        if buf.len() < HEADER_SIZE {
            return Err(HeaderFault::TooShort { len: buf.len() });
        }
        let index_size = LittleEndian::read_u64(&buf[..HEADER_SIZE]);
        if index_size % RECORD_SIZE as u64 != 0 {
            return Err(HeaderFault::Misaligned { index_size });
        }
        let available = (buf.len() - HEADER_SIZE) as u64;
        if index_size > available {
            return Err(HeaderFault::IndexOverrun { index_size, len: buf.len() });
        }
        Ok(Self { index_size })
    }

    pub fn write(&self, out: &mut [u8]) {
        LittleEndian::write_u64(&mut out[..HEADER_SIZE], self.index_size);
    }

    #[inline]
    pub fn index_size(&self) -> u64 {
        self.index_size
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        (self.index_size / RECORD_SIZE as u64) as usize
    }

    /// Absolute offset of the first data byte (just past header + index).
    #[inline]
    pub fn data_start(&self) -> u64 {
        HEADER_SIZE as u64 + self.index_size
    }
}
