//! Tools for reading a Mela export.
//!
//! A `.melarecipes` file is a ZIP archive with one JSON document per recipe.
//! Open it with [`map_file()`] (or read it into a buffer yourself),
//! wrap the bytes in a [`MelaArchive`], then walk its [`documents()`].
//!
//! [`map_file()`]: fn.map_file.html
//! [`MelaArchive`]: struct.MelaArchive.html
//! [`documents()`]: struct.MelaArchive.html#method.documents

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use camino::Utf8PathBuf;
use log::*;
use memmap2::Mmap;
use piz::read::FileMetadata;
use piz::ZipArchive;
use serde_json::Value;

use crate::result::*;

/// Memory maps the archive at the given path.
///
/// A missing file is reported as [`ConvertError::InputNotFound`]
/// so that callers can say so plainly.
///
/// [`ConvertError::InputNotFound`]: ../result/enum.ConvertError.html#variant.InputNotFound
pub fn map_file(path: &Path) -> ConvertResult<Mmap> {
    info!("Memory mapping {}", path.display());
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ConvertError::InputNotFound(path.to_owned()),
        _ => ConvertError::Io(e),
    })?;
    // An empty file can't be mapped, but it can't be a ZIP archive either.
    if file.metadata()?.len() == 0 {
        return Err(ConvertError::Archive(piz::result::ZipError::InvalidArchive(
            "Empty file",
        )));
    }
    let mapping = unsafe { Mmap::map(&file)? };
    Ok(mapping)
}

/// One entry of a Mela archive, parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// The entry's path inside the archive
    pub path: Utf8PathBuf,
    pub value: Value,
}

/// Size of an End Of Central Directory Record, sans comment
const EOCDR_SIZE: usize = 22;

/// Returns true if `bytes` is nothing but an End Of Central Directory Record
/// (plus its comment) listing no entries: a valid, empty ZIP archive.
fn is_bare_empty_archive(bytes: &[u8]) -> bool {
    if bytes.len() < EOCDR_SIZE || !bytes.starts_with(b"PK\x05\x06") {
        return false;
    }
    let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
    let entries_on_disk = u16_at(8);
    let entries = u16_at(10);
    let comment_length = u16_at(20) as usize;
    entries_on_disk == 0 && entries == 0 && bytes.len() == EOCDR_SIZE + comment_length
}

/// A Mela export to be read
pub struct MelaArchive<'a> {
    /// `None` for an archive with no entries at all
    archive: Option<ZipArchive<'a>>,
}

impl<'a> MelaArchive<'a> {
    /// Reads the archive's central directory from a byte slice.
    pub fn new(bytes: &'a [u8]) -> ConvertResult<Self> {
        let archive = match ZipArchive::new(bytes) {
            Ok(a) => a,
            // piz wants room for a Zip64 locator before the EOCDR,
            // which a zero-entry archive doesn't have.
            Err(piz::result::ZipError::InvalidArchive(_)) if is_bare_empty_archive(bytes) => {
                debug!("Empty archive");
                return Ok(Self { archive: None });
            }
            Err(e) => return Err(e.into()),
        };
        debug!("{} entries in archive", archive.entries().len());
        Ok(Self {
            archive: Some(archive),
        })
    }

    fn entries(&self) -> &[FileMetadata<'_>] {
        self.archive.as_ref().map_or(&[][..], |a| a.entries())
    }

    /// The number of recipe files in the archive
    pub fn len(&self) -> usize {
        self.files().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns an iterator that decompresses and parses each file in the
    /// archive, in the order the central directory lists them.
    ///
    /// Each item is its own `Result`, so a bad entry doesn't stop the
    /// caller from reading the rest. Directory entries are skipped.
    pub fn documents(&self) -> Documents<'_> {
        Documents {
            archive: self.archive.as_ref(),
            entries: self.entries().iter(),
        }
    }

    fn files(&self) -> impl Iterator<Item = &FileMetadata<'_>> + '_ {
        self.entries().iter().filter(|e| e.is_file())
    }
}

/// Iterator returned by [`MelaArchive::documents()`]
///
/// [`MelaArchive::documents()`]: struct.MelaArchive.html#method.documents
pub struct Documents<'a> {
    archive: Option<&'a ZipArchive<'a>>,
    entries: std::slice::Iter<'a, FileMetadata<'a>>,
}

impl Iterator for Documents<'_> {
    type Item = ConvertResult<SourceDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        let archive = self.archive?;
        let metadata = self.entries.find(|e| e.is_file())?;
        Some(read_document(archive, metadata))
    }
}

fn read_document(archive: &ZipArchive, metadata: &FileMetadata) -> ConvertResult<SourceDocument> {
    let path = metadata.path.clone().into_owned();
    debug!("Reading {}", path);

    let mut contents = Vec::with_capacity(metadata.size);
    archive
        .read(metadata)?
        .read_to_end(&mut contents)
        .map_err(|source| ConvertError::Entry {
            entry: path.clone(),
            source,
        })?;

    match serde_json::from_slice(&contents) {
        Ok(value) => Ok(SourceDocument { path, value }),
        Err(source) => Err(ConvertError::Parse {
            entry: path,
            source,
        }),
    }
}
