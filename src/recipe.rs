//! The two recipe shapes this crate knows about:
//! Mela's export format, and what Paprika imports.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One recipe from a Mela export.
///
/// Only `id` and `title` are required for a conversion,
/// but they're optional here so that their absence can be reported
/// as a [`SchemaError::MissingField`] instead of a generic decoding error.
/// A JSON `null` is treated the same as a missing key.
///
/// [`SchemaError::MissingField`]: ../result/enum.SchemaError.html
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MelaRecipe {
    pub id: Option<String>,
    pub title: Option<String>,
    /// Free-form description shown above the ingredients
    pub text: Option<String>,
    #[serde(rename = "yield")]
    pub servings: Option<String>,
    /// Seconds since 2001-01-01T00:00:00Z
    pub date: Option<f64>,
    pub cook_time: Option<String>,
    pub prep_time: Option<String>,
    pub total_time: Option<String>,
    pub categories: Option<Vec<String>>,
    pub nutrition: Option<String>,
    pub instructions: Option<String>,
    pub ingredients: Option<String>,
    pub notes: Option<String>,
    pub link: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub favorite: bool,
    /// Base64-encoded pictures. Paprika only gets the first.
    pub images: Option<Vec<String>>,
}

impl MelaRecipe {
    /// The first image, if the recipe has any.
    pub fn first_image(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|images| images.first())
            .map(String::as_str)
    }
}

/// Exporters aren't consistent about the favorite flag's type,
/// so accept anything and judge it the way a scripting language would.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_truthy(&value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// One recipe as Paprika expects to import it.
///
/// Paprika wants every key present, so nothing here is optional;
/// unknown values are empty strings or lists.
/// Fields are declared (and therefore serialized) in Paprika's own order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaprikaRecipe {
    pub uid: String,
    pub difficulty: String,
    pub servings: String,
    pub description: String,
    /// Uppercase hex SHA-256 of the Mela ID
    pub hash: String,
    /// Base64 image data, copied straight from Mela
    pub photo_data: String,
    pub photo_large: String,
    pub notes: String,
    pub photo: String,
    pub cook_time: String,
    pub image_url: String,
    pub photos: Vec<String>,
    pub name: String,
    pub total_time: String,
    pub categories: Vec<String>,
    pub nutritional_info: String,
    pub directions: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub created: String,
    pub source_url: String,
    /// 5 for favorites, 0 otherwise
    pub rating: u8,
    /// Hostname of `source_url`
    pub source: String,
    pub ingredients: String,
    pub prep_time: String,
    /// Uppercase hex SHA-256 of the SHA-256 of `photo_data`, or empty
    pub photo_hash: String,
}
