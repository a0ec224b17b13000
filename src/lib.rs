//! `.plank`: a flat container for an ordered list of byte blobs.
//!
//! A container is an 8-byte header (index size), an index of absolute
//! inclusive `(start, end)` offsets, and the blob bytes back to back. See
//! [`container`] for the layout and [`archive`] for the file-level API.

pub mod error;
pub mod header;
pub mod index;
pub mod container;
pub mod crypto;
pub mod manifest;
pub mod sniff;
pub mod archive;

pub use error::{HeaderFault, IndexFault, PlankError};
pub use header::{Header, HEADER_SIZE, RECORD_SIZE};
pub use index::{ContainerIndex, IndexRecord};
pub use container::{decode, decode_owned, encode, open, seal, Container};
pub use crypto::{Cipher, CipherError, KeyCipher, PasswordCipher};
pub use manifest::{Manifest, ManifestEntry};
