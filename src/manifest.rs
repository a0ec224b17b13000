//! Side-car manifest: names and content hashes for the blobs of one
//! container.
//!
//! The container itself carries no per-entry metadata. The manifest is a
//! parallel JSON document, one entry per blob in container order:
//!
//! ```json
//! {
//!   "created": "2026-10-16T12:00:00+00:00",
//!   "entries": [ { "name": "a.txt", "size": 3, "blake3": "…" } ]
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::IndexRecord;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest lists {expected} entries but there are {found} blobs")]
    CountMismatch { expected: usize, found: usize },
    #[error("Content of entry {index} ({name}) does not match its recorded hash")]
    HashMismatch { index: usize, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name:   String,
    pub size:   u64,
    /// BLAKE3 of the blob, lowercase hex.
    pub blake3: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub created: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Describe `blobs`, naming entry `i` after `names[i]`.
    pub fn build<S, B>(names: &[S], blobs: &[B]) -> Result<Self, ManifestError>
    where
        S: AsRef<str>,
        B: AsRef<[u8]> + Sync,
    {
        if names.len() != blobs.len() {
            return Err(ManifestError::CountMismatch { expected: names.len(), found: blobs.len() });
        }
        let entries = names.iter()
            .zip(blobs)
            .zip(hash_blobs(blobs))
            .map(|((name, blob), hash)| ManifestEntry {
                name:   name.as_ref().to_owned(),
                size:   blob.as_ref().len() as u64,
                blake3: hex::encode(hash),
            })
            .collect();
        Ok(Self { created: Utc::now().to_rfc3339(), entries })
    }

    /// Check that `blobs` are exactly the blobs this manifest describes.
    pub fn verify<B: AsRef<[u8]> + Sync>(&self, blobs: &[B]) -> Result<(), ManifestError> {
        if self.entries.len() != blobs.len() {
            return Err(ManifestError::CountMismatch {
                expected: self.entries.len(),
                found:    blobs.len(),
            });
        }
        for (index, (entry, hash)) in self.entries.iter().zip(hash_blobs(blobs)).enumerate() {
            let size = blobs[index].as_ref().len() as u64;
            if entry.size != size || entry.blake3 != hex::encode(hash) {
                return Err(ManifestError::HashMismatch { index, name: entry.name.clone() });
            }
        }
        Ok(())
    }

    /// Whether entry count and sizes line up with `records`. A manifest
    /// left over from an earlier container usually fails this.
    pub fn fits(&self, records: &[IndexRecord]) -> bool {
        self.entries.len() == records.len()
            && self.entries.iter().zip(records).all(|(e, rec)| e.size == rec.len())
    }

    pub fn name_for(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ManifestError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// BLAKE3 of every blob, in order. Fans out over Rayon with `parallel`.
fn hash_blobs<B: AsRef<[u8]> + Sync>(blobs: &[B]) -> Vec<[u8; 32]> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        blobs.par_iter().map(|b| <[u8; 32]>::from(blake3::hash(b.as_ref()))).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        blobs.iter().map(|b| <[u8; 32]>::from(blake3::hash(b.as_ref()))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ContainerIndex;

    #[test]
    fn build_and_verify() {
        let blobs = [b"alpha".to_vec(), Vec::new()];
        let m = Manifest::build(&["a.txt", "empty.bin"], &blobs).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.name_for(1), Some("empty.bin"));
        assert_eq!(m.entries[0].size, 5);
        assert_eq!(m.entries[0].blake3, blake3::hash(b"alpha").to_hex().to_string());
        m.verify(&blobs).unwrap();
    }

    #[test]
    fn build_rejects_count_mismatch() {
        let err = Manifest::build(&["only-one"], &[b"a".to_vec(), b"b".to_vec()]).unwrap_err();
        assert!(matches!(err, ManifestError::CountMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn verify_detects_changed_content() {
        let m = Manifest::build(&["x", "y"], &[b"one".to_vec(), b"two".to_vec()]).unwrap();
        let err = m.verify(&[b"one".to_vec(), b"twO".to_vec()]).unwrap_err();
        assert!(matches!(err, ManifestError::HashMismatch { index: 1, ref name } if name == "y"));
    }

    #[test]
    fn fits_checks_count_and_sizes() {
        let m = Manifest::build(&["a", "b"], &[b"12345".to_vec(), Vec::new()]).unwrap();
        let same = ContainerIndex::plan([5u64, 0]).unwrap();
        let resized = ContainerIndex::plan([5u64, 1]).unwrap();
        let longer = ContainerIndex::plan([5u64, 0, 2]).unwrap();
        assert!(m.fits(same.records()));
        assert!(!m.fits(resized.records()));
        assert!(!m.fits(longer.records()));
    }

    #[test]
    fn json_roundtrip_and_missing_created() {
        let m = Manifest::build(&["x"], &[b"1".to_vec()]).unwrap();
        assert_eq!(Manifest::from_bytes(&m.to_bytes().unwrap()).unwrap(), m);

        let bare = br#"{"entries":[{"name":"n","size":0,"blake3":"00"}]}"#;
        let parsed = Manifest::from_bytes(bare).unwrap();
        assert!(parsed.created.is_empty());
        assert_eq!(parsed.name_for(0), Some("n"));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(Manifest::from_bytes(b"{not json"), Err(ManifestError::Json(_))));
    }
}
