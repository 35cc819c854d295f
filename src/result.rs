//! Error types and the related `Result<T>`

use std::io;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// An error from underlying I/O
    #[error("I/O Error")]
    Io(#[from] io::Error),

    /// The input archive doesn't exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The Mela archive couldn't be opened as a ZIP container,
    /// or one of its entries couldn't be located in it.
    #[error("Couldn't read Mela archive")]
    Archive(#[from] piz::result::ZipError),

    /// Decompressing an entry failed (bad data, CRC mismatch, ...)
    #[error("Couldn't read entry {entry}")]
    Entry {
        entry: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry's contents weren't valid JSON.
    #[error("Entry {entry} isn't valid JSON")]
    Parse {
        entry: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry was JSON, but not a recipe we can convert.
    #[error("Entry {entry} isn't a usable recipe")]
    Schema {
        entry: Utf8PathBuf,
        #[source]
        source: SchemaError,
    },

    /// The output archive (or its parent directory) couldn't be created.
    #[error("Couldn't create {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the Paprika archive failed
    #[error("Couldn't write Paprika archive")]
    Write(#[from] zip::result::ZipError),

    /// A recipe couldn't be serialized.
    #[error("Couldn't encode recipe")]
    Encode(#[source] serde_json::Error),
}

impl ConvertError {
    /// True for problems with a single entry's contents,
    /// which `ConvertOptions::keep_going` skips over.
    pub fn is_per_entry(&self) -> bool {
        matches!(self, ConvertError::Parse { .. } | ConvertError::Schema { .. })
    }
}

/// Ways a parsed JSON document can fail to map to a Paprika recipe
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A key every recipe needs is absent (or null).
    #[error("Missing required key \"{0}\"")]
    MissingField(&'static str),

    /// The document is JSON, but not an object.
    #[error("Recipe isn't a JSON object")]
    NotAnObject,

    /// A key has the wrong type.
    #[error("Unexpected recipe shape")]
    Malformed(#[source] serde_json::Error),

    /// The `date` can't be placed on a calendar.
    #[error("Date {0} is out of range")]
    InvalidDate(f64),
}
