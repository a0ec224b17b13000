//! Guess a file extension from a blob's leading bytes.
//!
//! Only used to name unpacked blobs that have no manifest entry; the
//! container core never calls into this module.

/// One magic-number signature: every `(offset, bytes)` part must match.
struct Signature {
    ext:   &'static str,
    parts: &'static [(usize, &'static [u8])],
}

const SIGNATURES: &[Signature] = &[
    Signature { ext: "png",    parts: &[(0, b"\x89PNG\r\n\x1a\n")] },
    Signature { ext: "jpg",    parts: &[(0, b"\xff\xd8\xff")] },
    Signature { ext: "gif",    parts: &[(0, b"GIF8")] },
    Signature { ext: "webp",   parts: &[(0, b"RIFF"), (8, b"WEBP")] },
    Signature { ext: "wav",    parts: &[(0, b"RIFF"), (8, b"WAVE")] },
    Signature { ext: "avi",    parts: &[(0, b"RIFF"), (8, b"AVI ")] },
    Signature { ext: "bmp",    parts: &[(0, b"BM")] },
    Signature { ext: "tif",    parts: &[(0, b"II*\x00")] },
    Signature { ext: "tif",    parts: &[(0, b"MM\x00*")] },
    Signature { ext: "ico",    parts: &[(0, b"\x00\x00\x01\x00")] },
    Signature { ext: "pdf",    parts: &[(0, b"%PDF")] },
    Signature { ext: "zip",    parts: &[(0, b"PK\x03\x04")] },
    Signature { ext: "gz",     parts: &[(0, b"\x1f\x8b")] },
    Signature { ext: "bz2",    parts: &[(0, b"BZh")] },
    Signature { ext: "xz",     parts: &[(0, b"\xfd7zXZ\x00")] },
    Signature { ext: "7z",     parts: &[(0, b"7z\xbc\xaf\x27\x1c")] },
    Signature { ext: "zst",    parts: &[(0, b"\x28\xb5\x2f\xfd")] },
    Signature { ext: "tar",    parts: &[(257, b"ustar")] },
    Signature { ext: "mp3",    parts: &[(0, b"ID3")] },
    Signature { ext: "ogg",    parts: &[(0, b"OggS")] },
    Signature { ext: "flac",   parts: &[(0, b"fLaC")] },
    Signature { ext: "mp4",    parts: &[(4, b"ftyp")] },
    Signature { ext: "wasm",   parts: &[(0, b"\x00asm")] },
    Signature { ext: "elf",    parts: &[(0, b"\x7fELF")] },
    Signature { ext: "class",  parts: &[(0, b"\xca\xfe\xba\xbe")] },
    Signature { ext: "sqlite", parts: &[(0, b"SQLite format 3\x00")] },
];

impl Signature {
    fn matches(&self, data: &[u8]) -> bool {
        self.parts.iter().all(|&(offset, magic)| {
            data.get(offset..offset + magic.len()) == Some(magic)
        })
    }
}

/// Extension for the first signature `data` matches, if any.
pub fn extension_for(data: &[u8]) -> Option<&'static str> {
    SIGNATURES.iter().find(|s| s.matches(data)).map(|s| s.ext)
}
