//! Encode and decode whole containers.
//!
//! ```text
//! ┌──────────────┬──────────────────────────────┬────────────────────────┐
//! │ header (8 B) │ index (n × 16 B)             │ data                   │
//! │ index size   │ (start, end) per blob, LE    │ blob 0 | blob 1 | ...  │
//! └──────────────┴──────────────────────────────┴────────────────────────┘
//! ```
//!
//! ```
//! let container = plank::encode(&[&b"AB"[..], &b"C"[..]])?;
//! assert_eq!(container.len(), 43);
//! assert_eq!(plank::decode(&container)?, vec![&b"AB"[..], &b"C"[..]]);
//! # Ok::<(), plank::PlankError>(())
//! ```

use log::debug;

use crate::crypto::Cipher;
use crate::error::PlankError;
use crate::index::{ContainerIndex, IndexRecord};

/// Pack `blobs` into one container buffer, preserving order.
///
/// The output is allocated once at its final size.
pub fn encode<B: AsRef<[u8]>>(blobs: &[B]) -> Result<Vec<u8>, PlankError> {
    let index = ContainerIndex::plan(blobs.iter().map(|b| b.as_ref().len() as u64))?;
    let mut out = vec![0u8; index.total_len() as usize];
    index.write(&mut out);

    for (rec, blob) in index.iter().zip(blobs) {
        out[rec.range()].copy_from_slice(blob.as_ref());
    }
    debug!("encoded {} blob(s) into {} bytes", blobs.len(), out.len());
    Ok(out)
}

/// Unpack a container into borrowed views of its blobs.
///
/// Nothing is copied; on any validation failure no blobs are returned.
pub fn decode(container: &[u8]) -> Result<Vec<&[u8]>, PlankError> {
    let index = ContainerIndex::parse(container)?;
    let blobs: Vec<&[u8]> = index.iter().map(|rec| &container[rec.range()]).collect();
    debug!("decoded {} blob(s) from {} bytes", blobs.len(), container.len());
    Ok(blobs)
}

/// Like [`decode`], but copies each blob out of the container.
pub fn decode_owned(container: &[u8]) -> Result<Vec<Vec<u8>>, PlankError> {
    Ok(decode(container)?.into_iter().map(<[u8]>::to_vec).collect())
}

/// `encrypt ∘ encode`.
pub fn seal<B, C>(blobs: &[B], cipher: &C) -> Result<Vec<u8>, PlankError>
where
    B: AsRef<[u8]>,
    C: Cipher + ?Sized,
{
    let plain = encode(blobs)?;
    cipher.encrypt(&plain).map_err(PlankError::EncryptionFailed)
}

/// `decode ∘ decrypt`. A cipher failure is reported before any parsing.
pub fn open<C: Cipher + ?Sized>(bytes: &[u8], cipher: &C) -> Result<Container, PlankError> {
    let plain = cipher.decrypt(bytes).map_err(PlankError::DecryptionFailed)?;
    Container::from_bytes(plain)
}

/// A validated container that owns its bytes.
///
/// Blobs are served as slices of the one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    bytes: Vec<u8>,
    index: ContainerIndex,
}

impl Container {
    pub fn encode<B: AsRef<[u8]>>(blobs: &[B]) -> Result<Self, PlankError> {
        let bytes = encode(blobs)?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PlankError> {
        let index = ContainerIndex::parse(&bytes)?;
        Ok(Self { bytes, index })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&[u8]> {
        self.index.records().get(i).map(|rec| &self.bytes[rec.range()])
    }

    pub fn blobs(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
        self.index.iter().map(move |rec| &self.bytes[rec.range()])
    }

    pub fn records(&self) -> &[IndexRecord] {
        self.index.records()
    }

    pub fn to_blobs(&self) -> Vec<Vec<u8>> {
        self.blobs().map(<[u8]>::to_vec).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherError, KeyCipher};
    use crate::error::{HeaderFault, IndexFault};

    #[test]
    fn empty_list_is_eight_zero_bytes() {
        let out = encode::<&[u8]>(&[]).unwrap();
        assert_eq!(out, vec![0u8; 8]);
        assert!(decode(&out).unwrap().is_empty());
    }

    #[test]
    fn two_blob_layout_is_bit_exact() {
        let out = encode(&[&b"AB"[..], &b"C"[..]]).unwrap();
        let mut expected = vec![0x20, 0, 0, 0, 0, 0, 0, 0];
        expected.extend_from_slice(&40u64.to_le_bytes());
        expected.extend_from_slice(&41u64.to_le_bytes());
        expected.extend_from_slice(&42u64.to_le_bytes());
        expected.extend_from_slice(&42u64.to_le_bytes());
        expected.extend_from_slice(b"ABC");
        assert_eq!(out.len(), 43);
        assert_eq!(out, expected);
    }

    #[test]
    fn zero_length_blobs_roundtrip() {
        let blobs: Vec<&[u8]> = vec![&b""[..], &b"x"[..], &b""[..], &b""[..]];
        let out = encode(&blobs).unwrap();
        assert_eq!(out.len(), 8 + 4 * 16 + 1);
        assert_eq!(decode(&out).unwrap(), blobs);
    }

    #[test]
    fn decode_borrows_from_input() {
        let out = encode(&[b"hello".as_slice()]).unwrap();
        let blobs = decode(&out).unwrap();
        let base = out.as_ptr() as usize;
        assert_eq!(blobs[0].as_ptr() as usize, base + 24);
    }

    #[test]
    fn misaligned_header_is_malformed_header() {
        let mut buf = vec![0u8; 64];
        buf[0] = 17;
        assert_eq!(
            decode(&buf).unwrap_err(),
            PlankError::MalformedHeader(HeaderFault::Misaligned { index_size: 17 })
        );
    }

    #[test]
    fn record_past_end_is_malformed_index() {
        let mut buf = 16u64.to_le_bytes().to_vec();
        buf.extend_from_slice(&9u64.to_le_bytes());
        buf.extend_from_slice(&50u64.to_le_bytes());
        buf.resize(30, 0);
        assert!(matches!(decode(&buf), Err(PlankError::MalformedIndex(_))));
    }

    #[test]
    fn truncated_container_is_rejected() {
        let out = encode(&[&b"abc"[..], &b"def"[..]]).unwrap();
        let err = decode(&out[..out.len() - 1]).unwrap_err();
        assert_eq!(
            err,
            PlankError::MalformedIndex(IndexFault::OutOfBounds { record: 1, end: 45, len: 45 })
        );
    }

    #[test]
    fn encode_is_deterministic() {
        let blobs: [&[u8]; 3] = [b"one", b"two", b"three"];
        assert_eq!(encode(&blobs).unwrap(), encode(&blobs).unwrap());
    }

    #[test]
    fn container_accessors() {
        let c = Container::encode(&[b"AB".to_vec(), Vec::new(), b"C".to_vec()]).unwrap();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(0), Some(b"AB".as_slice()));
        assert_eq!(c.get(1), Some(b"".as_slice()));
        assert_eq!(c.get(3), None);
        assert_eq!(c.blobs().len(), 3);
        assert_eq!(c.to_blobs(), vec![b"AB".to_vec(), Vec::new(), b"C".to_vec()]);
        assert_eq!(c.records()[2].start, 8 + 48 + 2);
    }

    #[test]
    fn seal_then_open() {
        let cipher = KeyCipher::new([3u8; 32]);
        let sealed = seal(&[&b"alpha"[..], &b"beta"[..]], &cipher).unwrap();
        let c = open(&sealed, &cipher).unwrap();
        assert_eq!(c.to_blobs(), vec![b"alpha".to_vec(), b"beta".to_vec()]);
    }

    #[test]
    fn open_with_wrong_key_is_decryption_failed() {
        let sealed = seal(&[b"alpha".as_slice()], &KeyCipher::new([3u8; 32])).unwrap();
        let err = open(&sealed, &KeyCipher::new([4u8; 32])).unwrap_err();
        assert_eq!(err, PlankError::DecryptionFailed(CipherError::DecryptionFailed));
    }

    #[test]
    fn open_short_input_is_not_a_header_fault() {
        let err = open(&[0u8; 3], &KeyCipher::new([0u8; 32])).unwrap_err();
        assert!(matches!(err, PlankError::DecryptionFailed(_)));
        assert!(!err.is_malformed());
    }
}
