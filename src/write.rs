//! Tools for writing a Paprika archive.
//!
//! A `.paprikarecipes` file is a deflated ZIP archive where every entry is,
//! in turn, a gzipped JSON recipe. The double compression is pointless,
//! but it's what Paprika expects to open.

use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;

use chrono::{Datelike, Local, Timelike};
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::*;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::recipe::PaprikaRecipe;
use crate::result::*;

/// The extension Paprika looks for on each entry
pub const ENTRY_EXTENSION: &str = "paprikarecipe";

/// Longest entry name (in characters, before the extension)
pub const MAX_NAME_CHARS: usize = 80;

/// Entry name for recipes whose title leaves nothing usable
pub const FALLBACK_NAME: &str = "Recipe";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Derives an entry's file name (sans extension) from a recipe's name:
/// path separators become underscores and the result is capped at
/// [`MAX_NAME_CHARS`] characters.
///
/// [`MAX_NAME_CHARS`]: constant.MAX_NAME_CHARS.html
pub fn derived_name(recipe_name: &str) -> String {
    // All-separator titles would otherwise become a string of underscores.
    if recipe_name.chars().all(is_separator) {
        return FALLBACK_NAME.to_owned();
    }
    recipe_name
        .chars()
        .map(|c| if is_separator(c) { '_' } else { c })
        .take(MAX_NAME_CHARS)
        .collect()
}

/// The full entry name for a recipe: `<derived name>.paprikarecipe`
pub fn entry_name(recipe_name: &str) -> String {
    format!("{}.{}", derived_name(recipe_name), ENTRY_EXTENSION)
}

/// Serializes a recipe to JSON (leaving non-ASCII text as UTF-8)
/// and gzips it.
pub fn encode_recipe(recipe: &PaprikaRecipe) -> ConvertResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    serde_json::to_writer(&mut encoder, recipe).map_err(ConvertError::Encode)?;
    Ok(encoder.finish()?)
}

/// Collects recipes and writes them out as a Paprika archive.
///
/// Recipes are staged by entry name until [`finish()`] is called.
/// ZIP archives can technically hold duplicate names, but readers disagree
/// about which one wins, so a recipe whose name was already staged
/// replaces the earlier one.
///
/// [`finish()`]: struct.PaprikaArchiveWriter.html#method.finish
pub struct PaprikaArchiveWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    staged: IndexMap<String, Vec<u8>>,
    options: SimpleFileOptions,
}

impl PaprikaArchiveWriter<File> {
    /// Creates (or truncates) the archive at the given path,
    /// creating any missing parent directories first.
    pub fn create(path: &Path) -> ConvertResult<Self> {
        let created = |source| ConvertError::Create {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(created)?;
        }
        info!("Creating {}", path.display());
        let file = File::create(path).map_err(created)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Seek> PaprikaArchiveWriter<W> {
    pub fn new(sink: W) -> Self {
        let mut options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(now) = dos_now() {
            options = options.last_modified_time(now);
        }
        Self {
            zip: ZipWriter::new(sink),
            staged: IndexMap::new(),
            options,
        }
    }

    /// Encodes a recipe and stages it under its entry name.
    pub fn add(&mut self, recipe: &PaprikaRecipe) -> ConvertResult<()> {
        let contents = encode_recipe(recipe)?;
        match self.staged.entry(entry_name(&recipe.name)) {
            Entry::Occupied(mut occupied) => {
                warn!(
                    "More than one recipe is named {}; keeping the last",
                    occupied.key()
                );
                occupied.insert(contents);
            }
            Entry::Vacant(vacant) => {
                debug!("Staging {} ({} bytes)", vacant.key(), contents.len());
                vacant.insert(contents);
            }
        }
        Ok(())
    }

    /// The number of entries the archive will hold
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Writes every staged entry and the central directory,
    /// returning the underlying sink.
    pub fn finish(mut self) -> ConvertResult<W> {
        for (name, contents) in &self.staged {
            trace!("Writing {}", name);
            self.zip.start_file(name.as_str(), self.options.clone())?;
            self.zip.write_all(contents)?;
        }
        Ok(self.zip.finish()?)
    }
}

/// The current local time as a ZIP (MS-DOS) timestamp,
/// or `None` if it's outside what DOS dates can hold.
fn dos_now() -> Option<zip::DateTime> {
    let now = Local::now().naive_local();
    zip::DateTime::from_date_and_time(
        u16::try_from(now.year()).ok()?,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Cursor, Read};

    use flate2::read::GzDecoder;
    use piz::ZipArchive;

    fn recipe(name: &str, notes: &str) -> PaprikaRecipe {
        PaprikaRecipe {
            uid: "uid".to_owned(),
            difficulty: String::new(),
            servings: String::new(),
            description: String::new(),
            hash: "HASH".to_owned(),
            photo_data: String::new(),
            photo_large: String::new(),
            notes: notes.to_owned(),
            photo: String::new(),
            cook_time: String::new(),
            image_url: String::new(),
            photos: Vec::new(),
            name: name.to_owned(),
            total_time: String::new(),
            categories: Vec::new(),
            nutritional_info: String::new(),
            directions: String::new(),
            created: "2001-01-01 00:00:00".to_owned(),
            source_url: String::new(),
            rating: 0,
            source: String::new(),
            ingredients: String::new(),
            prep_time: String::new(),
            photo_hash: String::new(),
        }
    }

    fn gunzip(bytes: &[u8]) -> String {
        let mut text = String::new();
        GzDecoder::new(bytes).read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(derived_name("Soup"), "Soup");
        assert_eq!(derived_name("Soup/Stew\\Chili"), "Soup_Stew_Chili");
        assert_eq!(derived_name(""), FALLBACK_NAME);
        assert_eq!(derived_name("/"), FALLBACK_NAME);
        assert_eq!(derived_name("//\\"), FALLBACK_NAME);
        assert_eq!(derived_name("/a"), "_a");
        assert_eq!(entry_name("Soup"), "Soup.paprikarecipe");
    }

    #[test]
    fn test_long_names_are_truncated() {
        let long = "x".repeat(200);
        assert_eq!(derived_name(&long), "x".repeat(MAX_NAME_CHARS));
        let exact = "y".repeat(MAX_NAME_CHARS);
        assert_eq!(derived_name(&exact), exact);

        // Characters, not bytes
        let wide = "é".repeat(100);
        let name = derived_name(&wide);
        assert_eq!(name.chars().count(), MAX_NAME_CHARS);
        assert_eq!(name, "é".repeat(MAX_NAME_CHARS));
    }

    #[test]
    fn test_encode_keeps_unicode() {
        let encoded = encode_recipe(&recipe("Crème brûlée", "")).unwrap();
        assert_eq!(&encoded[..2], &[0x1f, 0x8b]);
        let text = gunzip(&encoded);
        assert!(text.contains("\"name\":\"Crème brûlée\""));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_archive_layout() {
        let mut writer = PaprikaArchiveWriter::new(Cursor::new(Vec::new()));
        writer.add(&recipe("Soup", "")).unwrap();
        writer.add(&recipe("Bread", "")).unwrap();
        assert_eq!(writer.len(), 2);
        let bytes = writer.finish().unwrap().into_inner();

        let archive = ZipArchive::new(&bytes).unwrap();
        let names: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(names, ["Soup.paprikarecipe", "Bread.paprikarecipe"]);
        for entry in archive.entries() {
            assert_eq!(entry.compression_method, piz::CompressionMethod::Deflate);
            let mut contents = Vec::new();
            archive.read(entry).unwrap().read_to_end(&mut contents).unwrap();
            let decoded: PaprikaRecipe = serde_json::from_str(&gunzip(&contents)).unwrap();
            assert_eq!(entry_name(&decoded.name), entry.path.as_str());
        }
    }

    #[test]
    fn test_last_duplicate_wins() {
        let mut writer = PaprikaArchiveWriter::new(Cursor::new(Vec::new()));
        writer.add(&recipe("Soup", "first")).unwrap();
        writer.add(&recipe("Bread", "")).unwrap();
        writer.add(&recipe("Soup", "second")).unwrap();
        assert_eq!(writer.len(), 2);
        let bytes = writer.finish().unwrap().into_inner();

        let archive = ZipArchive::new(&bytes).unwrap();
        assert_eq!(archive.entries().len(), 2);
        let soup = &archive.entries()[0];
        assert_eq!(soup.path.as_str(), "Soup.paprikarecipe");
        let mut contents = Vec::new();
        archive.read(soup).unwrap().read_to_end(&mut contents).unwrap();
        let decoded: PaprikaRecipe = serde_json::from_str(&gunzip(&contents)).unwrap();
        assert_eq!(decoded.notes, "second");
    }

    #[test]
    fn test_create_makes_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.paprikarecipes");
        let writer = PaprikaArchiveWriter::create(&path).unwrap();
        assert!(writer.is_empty());
        writer.finish().unwrap();
        assert!(path.is_file());
    }
}
