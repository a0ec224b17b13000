//! Index records and the offset arithmetic behind them.
//!
//! Each record is 16 bytes, `start: u64 LE` then `end: u64 LE`. Both are
//! absolute offsets into the whole container and the range is inclusive,
//! so a blob of `len` bytes occupies `start ..= start + len - 1`.
//!
//! A zero-length blob is stored as `end == start - 1`. Because every
//! `start` lies past the 8-byte header, this never underflows.

use std::ops::Range;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::error::{IndexFault, PlankError};
use crate::header::{Header, HEADER_SIZE, RECORD_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRecord {
    pub start: u64,
    pub end:   u64,
}

impl IndexRecord {
    /// Number of bytes covered by the record.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.wrapping_add(1).wrapping_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Half-open byte range of the record, for slicing a validated buffer.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end.wrapping_add(1) as usize
    }

    fn write(&self, out: &mut [u8]) {
        LittleEndian::write_u64(&mut out[0..8], self.start);
        LittleEndian::write_u64(&mut out[8..16], self.end);
    }

    fn read(buf: &[u8]) -> Self {
        Self {
            start: LittleEndian::read_u64(&buf[0..8]),
            end:   LittleEndian::read_u64(&buf[8..16]),
        }
    }
}

/// The header plus the full ordered list of index records for one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerIndex {
    header:  Header,
    records: Vec<IndexRecord>,
}

impl ContainerIndex {
    /// Lay out one record per blob length, in order.
    ///
    /// The running offset starts just past the header and index and
    /// advances by each length; any step that leaves the u64 offset space
    /// (or the address space of this platform) is `EncodeOverflow`.
    pub fn plan<I>(lengths: I) -> Result<Self, PlankError>
    where
        I: IntoIterator<Item = u64>,
        I::IntoIter: ExactSizeIterator,
    {
        let lengths = lengths.into_iter();
        let count = lengths.len();
        let header = Header::for_records(count)?;
        let overflow = || PlankError::EncodeOverflow { blobs: count };

        let mut offset = header.data_start();
        let mut records = Vec::with_capacity(count);
        for len in lengths {
            let next = offset.checked_add(len).ok_or_else(overflow)?;
            // next >= data_start >= HEADER_SIZE, so next - 1 cannot wrap.
            records.push(IndexRecord { start: offset, end: next - 1 });
            offset = next;
        }
        usize::try_from(offset).map_err(|_| overflow())?;

        debug!("planned {} record(s), data at {}, container {} bytes",
               count, header.data_start(), offset);
        Ok(Self { header, records })
    }

    /// Decode and validate the header and index at the front of `buf`.
    ///
    /// Every record must start exactly where the previous one ended, stay
    /// inside the buffer, and the last record must end on the buffer's last
    /// byte. The first violation found is returned.
    pub fn parse(buf: &[u8]) -> Result<Self, PlankError> {
        let header = Header::parse(buf)?;
        let count = header.record_count();
        let len = buf.len();
        debug!("header: index {} bytes, {} record(s), buffer {} bytes",
               header.index_size(), count, len);

        let index_bytes = &buf[HEADER_SIZE..header.data_start() as usize];
        let mut records = Vec::with_capacity(count);
        let mut expected = header.data_start();

        for (i, chunk) in index_bytes.chunks_exact(RECORD_SIZE).enumerate() {
            let rec = IndexRecord::read(chunk);
            trace!("record {i}: start {:#x} end {:#x}", rec.start, rec.end);

            if rec.start != expected {
                return Err(IndexFault::NotContiguous { record: i, expected, found: rec.start }.into());
            }
            if rec.end >= len as u64 {
                return Err(IndexFault::OutOfBounds { record: i, end: rec.end, len }.into());
            }
            // end < len here, so end + 1 cannot wrap.
            if rec.start > rec.end + 1 {
                return Err(IndexFault::Inverted { record: i, start: rec.start, end: rec.end }.into());
            }
            expected = rec.end + 1;
            records.push(rec);
        }

        if expected != len as u64 {
            return Err(IndexFault::TrailingBytes { accounted: expected, len }.into());
        }
        Ok(Self { header, records })
    }

    #[inline]
    pub fn header(&self) -> Header {
        self.header
    }

    #[inline]
    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    /// Container length implied by the index.
    pub fn total_len(&self) -> u64 {
        match self.records.last() {
            Some(last) => last.end.wrapping_add(1),
            None       => self.header.data_start(),
        }
    }

    /// Write header and all records into the front of `out`.
    pub fn write(&self, out: &mut [u8]) {
        self.header.write(out);
        let index_end = self.header.data_start() as usize;
        for (rec, slot) in self.records.iter()
            .zip(out[HEADER_SIZE..index_end].chunks_exact_mut(RECORD_SIZE))
        {
            rec.write(slot);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexRecord> {
        self.records.iter()
    }
}
