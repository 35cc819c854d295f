//! The whole conversion: read every Mela document, map each to a Paprika
//! recipe, then write them all out.

use std::error::Error;
use std::path::Path;

use log::*;

use crate::mapping::map_record;
use crate::read::{self, MelaArchive, SourceDocument};
use crate::recipe::PaprikaRecipe;
use crate::result::*;
use crate::write::PaprikaArchiveWriter;

/// Knobs for [`convert_archive()`]
///
/// [`convert_archive()`]: fn.convert_archive.html
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertOptions {
    /// Skip entries that aren't valid JSON or aren't usable recipes
    /// (with a warning) instead of failing the whole conversion.
    pub keep_going: bool,
}

/// What a conversion did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Recipes successfully read and mapped
    pub converted: usize,
    /// Entries in the output archive.
    /// Less than `converted` when recipes share a name.
    pub written: usize,
    /// Entries skipped due to `keep_going`
    pub skipped: usize,
}

/// Converts the Mela archive at `input` to a Paprika archive at `output`.
///
/// Everything is read and mapped before `output` is touched,
/// so a failed conversion doesn't leave a partial archive behind.
pub fn convert_archive(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> ConvertResult<ConvertSummary> {
    let mapping = read::map_file(input)?;
    let archive = MelaArchive::new(&mapping)?;
    info!("Reading {} entries from {}", archive.len(), input.display());

    let mut skipped = 0;
    let mut documents = Vec::with_capacity(archive.len());
    for document in archive.documents() {
        match document {
            Ok(d) => documents.push(d),
            Err(e) => skip_or_fail(e, options, &mut skipped)?,
        }
    }

    let recipes = map_documents(documents, options, &mut skipped)?;

    let mut writer = PaprikaArchiveWriter::create(output)?;
    for recipe in &recipes {
        writer.add(recipe)?;
    }
    let written = writer.len();
    writer.finish()?;
    info!("Wrote {} entries to {}", written, output.display());

    Ok(ConvertSummary {
        converted: recipes.len(),
        written,
        skipped,
    })
}

fn map_documents(
    documents: Vec<SourceDocument>,
    options: &ConvertOptions,
    skipped: &mut usize,
) -> ConvertResult<Vec<PaprikaRecipe>> {
    let mut recipes = Vec::with_capacity(documents.len());
    for SourceDocument { path, value } in documents {
        match map_record(&value) {
            Ok(recipe) => {
                debug!("{} is \"{}\"", path, recipe.name);
                recipes.push(recipe);
            }
            Err(source) => {
                let error = ConvertError::Schema {
                    entry: path,
                    source,
                };
                skip_or_fail(error, options, skipped)?;
            }
        }
    }
    Ok(recipes)
}

fn skip_or_fail(
    error: ConvertError,
    options: &ConvertOptions,
    skipped: &mut usize,
) -> ConvertResult<()> {
    if !(options.keep_going && error.is_per_entry()) {
        return Err(error);
    }
    match error.source() {
        Some(cause) => warn!("Skipping: {}: {}", error, cause),
        None => warn!("Skipping: {}", error),
    }
    *skipped += 1;
    Ok(())
}
