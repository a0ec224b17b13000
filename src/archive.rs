//! File-level pack/unpack, the surface the CLI is built on.
//!
//! ```no_run
//! use plank::archive::{pack_paths, unpack_path, PackOptions, UnpackOptions};
//!
//! pack_paths(&["a.txt", "b.png"], "out.plank", &PackOptions::default())?;
//! let written = unpack_path("out.plank", "restored", &UnpackOptions::default())?;
//! assert_eq!(written.len(), 2);
//! # Ok::<(), plank::archive::ArchiveError>(())
//! ```
//!
//! Names are never stored in the container. When packing, a side-car
//! manifest (`<container>.json`) records each input's file name and hash;
//! when unpacking, names come from that manifest or, failing that, from the
//! blob's position plus a sniffed extension.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::container::{self, Container};
use crate::crypto::{Cipher, KeyCipher, PasswordCipher, KEY_LEN};
use crate::error::PlankError;
use crate::manifest::{Manifest, ManifestError};
use crate::sniff;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Container(#[from] PlankError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("Input path has no file name: {}", .0.display())]
    UnnamedInput(PathBuf),
    #[error("Verification requested but no manifest found at {}", .0.display())]
    MissingManifest(PathBuf),
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Where the whole-container key comes from.
#[derive(Clone)]
pub enum CipherSpec {
    /// Argon2id-derived key; the salt travels with the container.
    Password(String),
    /// Raw AES-256 key.
    Key([u8; KEY_LEN]),
}

impl CipherSpec {
    pub fn to_cipher(&self) -> Box<dyn Cipher> {
        match self {
            CipherSpec::Password(p) => Box::new(PasswordCipher::new(p.clone())),
            CipherSpec::Key(k)      => Box::new(KeyCipher::new(*k)),
        }
    }
}

impl fmt::Debug for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherSpec::Password(_) => f.write_str("Password(..)"),
            CipherSpec::Key(_)      => f.write_str("Key(..)"),
        }
    }
}

/// Configuration for [`pack_paths`].
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// When set, the finished container is encrypted as a whole.
    pub cipher:         Option<CipherSpec>,
    /// Write `<container>.json` alongside the container. When off, a
    /// manifest left there by an earlier pack is removed.
    ///
    /// The manifest is plain JSON even when `cipher` is set: file names,
    /// sizes and BLAKE3 hashes of the contents stay readable. Turn this off
    /// when those must not leak.
    pub write_manifest: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self { cipher: None, write_manifest: true }
    }
}

/// Configuration for [`unpack_path`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    pub cipher:           Option<CipherSpec>,
    /// Check every blob against the manifest before writing anything.
    pub verify:           bool,
    /// Name manifest-less blobs `"{i}.{ext}"` from their content.
    pub sniff_extensions: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self { cipher: None, verify: false, sniff_extensions: true }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PackReport {
    pub container: PathBuf,
    pub manifest:  Option<PathBuf>,
    pub blobs:     usize,
    /// Bytes written for the container (after encryption, if any).
    pub bytes:     u64,
}

/// One row of [`inspect_path`].
#[derive(Debug, Clone)]
pub struct EntryInfo {
    pub index: usize,
    pub name:  Option<String>,
    pub start: u64,
    pub end:   u64,
    pub size:  u64,
    pub kind:  Option<&'static str>,
}

// ── Operations ────────────────────────────────────────────────────────────────

/// Side-car manifest path for a container: `<container>.json`.
pub fn manifest_path(container: &Path) -> PathBuf {
    let mut name = OsString::from(container.as_os_str());
    name.push(".json");
    PathBuf::from(name)
}

/// Read every input, pack them in order, and write the container (and
/// manifest, unless disabled) to `output`.
pub fn pack_paths<P, Q>(inputs: &[P], output: Q, opts: &PackOptions) -> Result<PackReport, ArchiveError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let output = output.as_ref();
    let mut names = Vec::with_capacity(inputs.len());
    let mut blobs = Vec::with_capacity(inputs.len());
    for path in inputs {
        let path = path.as_ref();
        let name = path.file_name()
            .ok_or_else(|| ArchiveError::UnnamedInput(path.to_owned()))?
            .to_string_lossy()
            .into_owned();
        let data = fs::read(path)?;
        debug!("read {} ({} bytes)", path.display(), data.len());
        names.push(name);
        blobs.push(data);
    }

    let bytes = match &opts.cipher {
        Some(spec) => container::seal(&blobs, &*spec.to_cipher())?,
        None       => container::encode(&blobs)?,
    };
    fs::write(output, &bytes)?;
    info!("wrote {} blob(s) to {} ({} bytes)", blobs.len(), output.display(), bytes.len());

    let manifest = if opts.write_manifest {
        let path = manifest_path(output);
        fs::write(&path, Manifest::build(&names, &blobs)?.to_bytes()?)?;
        Some(path)
    } else {
        remove_stale_manifest(output)?;
        None
    };

    Ok(PackReport {
        container: output.to_owned(),
        manifest,
        blobs: blobs.len(),
        bytes: bytes.len() as u64,
    })
}

/// Unpack every blob of `input` into `out_dir`, creating it if needed.
///
/// Returns the written paths in container order. With `verify` set, all
/// blobs are checked against the manifest before any file is written.
pub fn unpack_path<P, Q>(input: P, out_dir: Q, opts: &UnpackOptions) -> Result<Vec<PathBuf>, ArchiveError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref();
    let out_dir = out_dir.as_ref();
    let container = load(input, opts.cipher.as_ref())?;
    let manifest = load_manifest(input)?;
    let names = naming_manifest(input, manifest.as_ref(), &container);

    if opts.verify {
        let m = manifest.as_ref()
            .ok_or_else(|| ArchiveError::MissingManifest(manifest_path(input)))?;
        let blobs: Vec<&[u8]> = container.blobs().collect();
        if let Err(e) = m.verify(&blobs) {
            warn!("{}: {e}", input.display());
            return Err(e.into());
        }
        info!("{}: {} blob(s) verified", input.display(), blobs.len());
    }

    fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(container.len());
    let mut taken = HashSet::with_capacity(container.len());
    for (i, blob) in container.blobs().enumerate() {
        let mut name = output_name(i, blob, names, opts.sniff_extensions);
        if !taken.insert(name.clone()) {
            name = unique_name(i, &name, &taken);
            warn!("{}: blob {i} renamed to {name} to avoid a name collision", input.display());
            taken.insert(name.clone());
        }
        let path = out_dir.join(name);
        fs::write(&path, blob)?;
        debug!("wrote {} ({} bytes)", path.display(), blob.len());
        written.push(path);
    }
    Ok(written)
}

/// Describe every record of `input` without writing anything.
pub fn inspect_path<P: AsRef<Path>>(input: P, cipher: Option<&CipherSpec>) -> Result<Vec<EntryInfo>, ArchiveError> {
    let input = input.as_ref();
    let container = load(input, cipher)?;
    let manifest = load_manifest(input)?;
    let names = naming_manifest(input, manifest.as_ref(), &container);

    Ok(container.records().iter()
        .zip(container.blobs())
        .enumerate()
        .map(|(index, (rec, blob))| EntryInfo {
            index,
            name:  names.and_then(|m| m.name_for(index)).map(str::to_owned),
            start: rec.start,
            end:   rec.end,
            size:  rec.len(),
            kind:  sniff::extension_for(blob),
        })
        .collect())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn load(input: &Path, cipher: Option<&CipherSpec>) -> Result<Container, ArchiveError> {
    let bytes = fs::read(input)?;
    let container = match cipher {
        Some(spec) => container::open(&bytes, &*spec.to_cipher())?,
        None       => Container::from_bytes(bytes)?,
    };
    debug!("{}: {} record(s)", input.display(), container.len());
    Ok(container)
}

fn load_manifest(input: &Path) -> Result<Option<Manifest>, ArchiveError> {
    match fs::read(manifest_path(input)) {
        Ok(bytes) => Ok(Some(Manifest::from_bytes(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove_stale_manifest(output: &Path) -> Result<(), ArchiveError> {
    let path = manifest_path(output);
    match fs::remove_file(&path) {
        Ok(()) => {
            debug!("removed stale manifest {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// The manifest to take names from, or `None` when its entries do not line
/// up with the container's records.
fn naming_manifest<'m>(input: &Path, manifest: Option<&'m Manifest>, container: &Container) -> Option<&'m Manifest> {
    let m = manifest?;
    if m.fits(container.records()) {
        Some(m)
    } else {
        warn!(
            "{}: manifest lists {} entries that do not match the {} record(s); ignoring its names",
            input.display(), m.len(), container.len(),
        );
        None
    }
}

/// `"{i}-{name}"`, with a further counter if even that is taken.
fn unique_name(i: usize, name: &str, taken: &HashSet<String>) -> String {
    let base = format!("{i}-{name}");
    let mut candidate = base.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    candidate
}

/// File name for blob `i`: the manifest's name reduced to its last
/// component, else the index with a sniffed extension.
fn output_name(i: usize, blob: &[u8], manifest: Option<&Manifest>, sniff_ext: bool) -> String {
    let recorded = manifest
        .and_then(|m| m.name_for(i))
        .and_then(|n| Path::new(n).file_name())
        .map(|n| n.to_string_lossy().into_owned());
    if let Some(name) = recorded {
        return name;
    }
    match sniff_ext.then(|| sniff::extension_for(blob)).flatten() {
        Some(ext) => format!("{i}.{ext}"),
        None      => i.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_appends_json() {
        assert_eq!(manifest_path(Path::new("dir/out.plank")), PathBuf::from("dir/out.plank.json"));
    }

    #[test]
    fn output_name_prefers_manifest_file_name() {
        let m = Manifest::build(&["../../etc/passwd", "b.txt"], &[b"x".to_vec(), b"y".to_vec()]).unwrap();
        assert_eq!(output_name(0, b"x", Some(&m), true), "passwd");
        assert_eq!(output_name(1, b"y", Some(&m), true), "b.txt");
    }

    #[test]
    fn output_name_falls_back_to_sniffing() {
        assert_eq!(output_name(3, b"%PDF-1.4", None, true), "3.pdf");
        assert_eq!(output_name(3, b"%PDF-1.4", None, false), "3");
        assert_eq!(output_name(0, b"plain text", None, true), "0");
    }

    #[test]
    fn unique_name_prefixes_index() {
        let mut taken = HashSet::new();
        taken.insert("x.txt".to_owned());
        assert_eq!(unique_name(1, "x.txt", &taken), "1-x.txt");
        taken.insert("1-x.txt".to_owned());
        assert_eq!(unique_name(1, "x.txt", &taken), "1-x.txt-1");
    }

    #[test]
    fn mismatched_manifest_is_not_used_for_names() {
        let container = Container::encode(&[b"\x89PNG\r\n\x1a\n".to_vec(), b"key".to_vec()]).unwrap();
        let stale = Manifest::build(&["secret.key"], &[b"key".to_vec()]).unwrap();
        assert!(naming_manifest(Path::new("c.plank"), Some(&stale), &container).is_none());

        let good = Manifest::build(&["a.png", "secret.key"], &container.to_blobs()).unwrap();
        assert!(naming_manifest(Path::new("c.plank"), Some(&good), &container).is_some());
    }

    #[test]
    fn cipher_spec_debug_hides_secret() {
        let shown = format!("{:?}", CipherSpec::Password("s3cret".into()));
        assert!(!shown.contains("s3cret"));
    }
}
