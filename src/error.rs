//! Error taxonomy for the container core.
//!
//! Every failure is local and recoverable: encode/decode either return a
//! complete result or one of these values, never a partial blob list.

use thiserror::Error;

use crate::crypto::CipherError;

/// Why the 8-byte header could not be accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderFault {
    #[error("buffer is {len} bytes, shorter than the 8-byte header")]
    TooShort { len: usize },
    #[error("index size {index_size} is not a multiple of the 16-byte record size")]
    Misaligned { index_size: u64 },
    #[error("index of {index_size} bytes does not fit in a {len}-byte buffer")]
    IndexOverrun { index_size: u64, len: usize },
}

/// Why an index record (or the index as a whole) is inconsistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexFault {
    #[error("record {record} starts at {found}, expected {expected}")]
    NotContiguous { record: usize, expected: u64, found: u64 },
    #[error("record {record} is inverted (start {start}, end {end})")]
    Inverted { record: usize, start: u64, end: u64 },
    #[error("record {record} ends at {end}, past the last byte of a {len}-byte buffer")]
    OutOfBounds { record: usize, end: u64, len: usize },
    #[error("index accounts for {accounted} bytes but the buffer holds {len}")]
    TrailingBytes { accounted: u64, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlankError {
    #[error("{blobs} blob(s) overflow the 64-bit offset space")]
    EncodeOverflow { blobs: usize },
    #[error("Malformed header: {0}")]
    MalformedHeader(#[from] HeaderFault),
    #[error("Malformed index: {0}")]
    MalformedIndex(#[from] IndexFault),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(#[source] CipherError),
    #[error("Encryption failed: {0}")]
    EncryptionFailed(#[source] CipherError),
}

impl PlankError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, PlankError::MalformedHeader(_) | PlankError::MalformedIndex(_))
    }
}
