//! mela2paprika converts recipe exports from [Mela](https://mela.recipes)
//! into archives [Paprika](https://www.paprikaapp.com) can import:
//!
//! ```no_run
//! # use std::path::Path;
//! # use mela2paprika::*;
//! let summary = convert_archive(
//!     Path::new("Recipes.melarecipes"),
//!     Path::new("Recipes.paprikarecipes"),
//!     &ConvertOptions::default(),
//! )?;
//! println!("Converted {} recipes", summary.converted);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Both formats are ZIP archives with one JSON document per recipe.
//! Mela stores its documents as-is; Paprika gzips each one first
//! and uses a different schema. The pieces are usable on their own:
//!
//! ```no_run
//! # use std::fs;
//! # use std::io::Cursor;
//! # use mela2paprika::*;
//! # use mela2paprika::read::MelaArchive;
//! # use mela2paprika::write::PaprikaArchiveWriter;
//! let bytes = fs::read("Recipes.melarecipes")?;
//! let archive = MelaArchive::new(&bytes)?;
//!
//! let mut writer = PaprikaArchiveWriter::new(Cursor::new(Vec::new()));
//! for document in archive.documents() {
//!     let document = document?;
//!     match map_record(&document.value) {
//!         Ok(recipe) => writer.add(&recipe)?,
//!         Err(e) => eprintln!("Skipping {}: {}", document.path, e),
//!     }
//! }
//! let paprika_bytes = writer.finish()?.into_inner();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod convert;
pub mod mapping;
pub mod read;
pub mod recipe;
pub mod result;
pub mod write;

pub use convert::{convert_archive, ConvertOptions, ConvertSummary};
pub use mapping::map_record;
pub use recipe::{MelaRecipe, PaprikaRecipe};
