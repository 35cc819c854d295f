//! Maps a Mela recipe onto Paprika's schema.
//!
//! Most fields are straight renames. The rest are derived:
//!
//! - `hash` and `photo_hash` are SHA-256 digests Paprika uses to spot
//!   duplicates and changed photos.
//! - `created` moves Mela's timestamp from its 2001 epoch to the Unix one
//!   and renders it in local time.
//! - `source` is the host of the recipe's link.

use std::fmt;

use chrono::{DateTime, Local, TimeZone};
use log::*;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::{Host, Url};
use uuid::Uuid;

use crate::recipe::{MelaRecipe, PaprikaRecipe};
use crate::result::SchemaError;

/// Seconds from the Unix epoch to Mela's, 2001-01-01T00:00:00Z.
pub const MELA_EPOCH_OFFSET: i64 = 978_307_200;

/// How Paprika wants `created` formatted
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The rating given to Mela favorites (Paprika's scale tops out at 5 stars).
pub const FAVORITE_RATING: u8 = 5;

/// Converts a parsed Mela document into a Paprika recipe,
/// rendering `created` in the local time zone.
///
/// Aside from the freshly generated `uid`,
/// the same document always maps to the same recipe.
pub fn map_record(document: &Value) -> Result<PaprikaRecipe, SchemaError> {
    map_record_in(document, &Local)
}

/// Like [`map_record()`], but renders `created` in the given time zone.
///
/// [`map_record()`]: fn.map_record.html
pub fn map_record_in<Tz>(document: &Value, tz: &Tz) -> Result<PaprikaRecipe, SchemaError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    // Serde would happily read a struct out of an array; we don't want that.
    if !document.is_object() {
        return Err(SchemaError::NotAnObject);
    }
    let mela = MelaRecipe::deserialize(document).map_err(SchemaError::Malformed)?;
    trace!("{:?}", mela);

    let id = mela.id.as_deref().ok_or(SchemaError::MissingField("id"))?;
    let name = mela
        .title
        .clone()
        .ok_or(SchemaError::MissingField("title"))?;

    let hash = sha256_hex(id.as_bytes());
    let created = format_created(mela.date.unwrap_or(0.0), tz)?;
    let image = mela.first_image();
    let photo_hash = image.map(photo_hash).unwrap_or_default();
    let photo_data = image.map(str::to_owned).unwrap_or_default();
    let source = mela.link.as_deref().map(hostname).unwrap_or_default();
    let rating = if mela.favorite { FAVORITE_RATING } else { 0 };

    Ok(PaprikaRecipe {
        uid: Uuid::new_v4().to_string(),
        difficulty: String::new(),
        servings: mela.servings.unwrap_or_default(),
        description: mela.text.unwrap_or_default(),
        hash,
        photo_data,
        photo_large: String::new(),
        notes: mela.notes.unwrap_or_default(),
        photo: String::new(),
        cook_time: mela.cook_time.unwrap_or_default(),
        image_url: String::new(),
        photos: Vec::new(),
        name,
        total_time: mela.total_time.unwrap_or_default(),
        categories: mela.categories.unwrap_or_default(),
        nutritional_info: mela.nutrition.unwrap_or_default(),
        directions: mela.instructions.unwrap_or_default(),
        created,
        source_url: mela.link.unwrap_or_default(),
        rating,
        source,
        ingredients: mela.ingredients.unwrap_or_default(),
        prep_time: mela.prep_time.unwrap_or_default(),
        photo_hash,
    })
}

/// Uppercase hex SHA-256 of the given bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(bytes))
}

/// Hashes an (encoded) image the way Paprika does:
/// the SHA-256 of the image's raw SHA-256 digest, in uppercase hex.
pub fn photo_hash(image: &str) -> String {
    sha256_hex(&Sha256::digest(image.as_bytes()))
}

/// Moves a Mela timestamp to the Unix epoch, dropping any fractional second.
///
/// Returns `None` for non-finite inputs or ones that overflow an `i64`.
pub fn mela_date_to_unix(seconds: f64) -> Option<i64> {
    if !seconds.is_finite() {
        return None;
    }
    // Float-to-int casts saturate, so huge values fall out at checked_add().
    (seconds.trunc() as i64).checked_add(MELA_EPOCH_OFFSET)
}

/// Renders a Mela timestamp as a wall-clock time in the given zone.
pub fn format_created<Tz>(seconds: f64, tz: &Tz) -> Result<String, SchemaError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let instant = mela_date_to_unix(seconds)
        .and_then(|unix| DateTime::from_timestamp(unix, 0))
        .ok_or(SchemaError::InvalidDate(seconds))?;
    Ok(instant.with_timezone(tz).format(CREATED_FORMAT).to_string())
}

/// Returns the host of the given URL,
/// or an empty string if it has none (or isn't a URL at all).
///
/// Internationalized domains come back in Unicode, not Punycode,
/// and a bogus port doesn't cost us the host.
pub fn hostname(link: &str) -> String {
    let parsed = match Url::parse(link) {
        Err(url::ParseError::InvalidPort) => {
            debug!("Ignoring bad port in link {:?}", link);
            without_port(link).map(|l| Url::parse(&l))
        }
        other => Some(other),
    };
    let url = match parsed {
        Some(Ok(u)) => u,
        Some(Err(e)) => {
            if !link.is_empty() {
                debug!("Couldn't parse link {:?}: {}", link, e);
            }
            return String::new();
        }
        None => return String::new(),
    };
    match url.host() {
        Some(Host::Domain(domain)) => url::quirks::domain_to_unicode(domain).to_lowercase(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    }
}

/// Drops the `:port` from a URL's authority, if there is one.
fn without_port(link: &str) -> Option<String> {
    let authority_start = link.find("://")? + 3;
    let rest = &link[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_len];

    // Skip any userinfo and IPv6 brackets, which have colons of their own.
    let host_start = authority.rfind('@').map_or(0, |i| i + 1);
    let host_end = authority[host_start..]
        .rfind(']')
        .map_or(host_start, |i| host_start + i + 1);
    let colon = host_end + authority[host_end..].find(':')?;

    Some(format!(
        "{}{}{}",
        &link[..authority_start],
        &authority[..colon],
        &rest[authority_len..]
    ))
}
