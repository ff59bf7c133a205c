//! Core record types for roster.
//!
//! A [`Record`] is one person entry. The whole ordered collection is stored
//! under a single key as a JSON array of objects with string-valued `name`,
//! `surname`, `age` and `location` fields.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// In-memory identifier of a record.
///
/// Assigned when a record is loaded or created and never reused by the same
/// [`RecordStore`](crate::RecordStore). Ids are not persisted; on disk a
/// record is identified only by its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single person record.
///
/// All fields are free text. `age` keeps whatever text was entered and is
/// never parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Age as entered.
    #[serde(deserialize_with = "text_or_number")]
    pub age: String,
    /// Where the person is from.
    pub location: String,
}

impl Record {
    /// Create a record from its four fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        age: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            age: age.into(),
            location: location.into(),
        }
    }

    /// Check whether `term` occurs in the name, surname or location,
    /// ignoring case. The age is never matched. An empty term matches.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        self.matches_needle(&term.to_lowercase())
    }

    /// Same as [`Record::matches`] for a needle that is already lowercase.
    pub(crate) fn matches_needle(&self, needle: &str) -> bool {
        [&self.name, &self.surname, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}, {} ({})",
            self.name, self.surname, self.age, self.location
        )
    }
}

/// Accepts a string, a number or null for a text field.
///
/// Older writers may have stored `age` as a JSON number.
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        None => String::new(),
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Integer(n)) => n.to_string(),
        Some(TextOrNumber::Float(n)) => n.to_string(),
    })
}

/// Serialize a collection to its stored JSON form.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode_collection(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parse a stored collection.
///
/// Blank content and the JSON literal `null` decode to an empty collection.
///
/// # Errors
///
/// Returns [`Error::CorruptCollection`] if `raw` is not a JSON array of
/// record objects.
pub fn decode_collection(key: &str, raw: &str) -> Result<Vec<Record>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let records: Option<Vec<Record>> =
        serde_json::from_str(raw).map_err(|source| Error::corrupt_collection(key, source))?;
    Ok(records.unwrap_or_default())
}
