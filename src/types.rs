//! Documents exchanged between the builder, the resolver, and the site.
//!
//! Both are plain JSON files that live next to the published site:
//!
//! - `portfolio-index.json` is generated by [`crate::index`] from the bucket
//!   listing and overwritten on every run.
//! - `portfolio-mapping.json` is written by hand and read by
//!   [`crate::resolve`].
//!
//! Field names are camelCase on disk because the browser reads the same files.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Generated index of every image in the bucket, grouped by top-level folder.
///
/// `folders` is an ordered list of `(folder, filenames)` pairs rather than a
/// map: the builder sorts folders case-insensitively, and that order has to
/// survive serialization. On disk it is a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioIndex {
    #[serde(serialize_with = "serialize_timestamp")]
    pub generated_at: DateTime<Utc>,
    pub bucket_name: String,
    #[serde(rename = "bucketBaseURL")]
    pub bucket_base_url: String,
    #[serde(with = "ordered_map")]
    pub folders: Vec<(String, Vec<String>)>,
}

impl PortfolioIndex {
    /// Filenames of a folder, by exact name.
    pub fn files(&self, folder: &str) -> Option<&[String]> {
        self.folders
            .iter()
            .find(|(name, _)| name == folder)
            .map(|(_, files)| files.as_slice())
    }

    pub fn contains_folder(&self, folder: &str) -> bool {
        self.files(folder).is_some()
    }

    pub fn folder_names(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().map(|(name, _)| name.as_str())
    }
}

/// Millisecond precision with a `Z` suffix, the format browsers emit for
/// `Date.toISOString()`.
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// A JSON object read into and written from an ordered list of pairs, so the
/// document's key order survives a round trip.
mod ordered_map {
    use serde::de::{Deserialize, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S: Serializer, V: Serialize>(
        entries: &[(String, V)],
        s: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(d: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct PairsVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for PairsVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        d.deserialize_map(PairsVisitor(PhantomData))
    }
}

/// Hand-curated display names and categories for bucket folders.
///
/// ```json
/// {
///   "categoriesOrder": ["brandcampaignshoot", "event", "portrait"],
///   "mappings": {
///     "ASABI - PILOT": { "displayName": "Asabi Pilot", "category": "brandcampaignshoot" },
///     "STREET SOUK 23'": { "category": "event" }
///   }
/// }
/// ```
///
/// Entries may name folders that no longer exist in the bucket, and the
/// bucket may hold folders with no entry; the resolver handles both. Entry
/// order is significant: the first of two entries claiming the same display
/// name wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDocument {
    #[serde(default)]
    pub categories_order: Vec<String>,
    /// Entries in document order.
    #[serde(default, with = "ordered_map")]
    pub mappings: Vec<(String, MappingEntry)>,
}

impl MappingDocument {
    pub fn entry(&self, folder: &str) -> Option<&MappingEntry> {
        self.mappings
            .iter()
            .find(|(name, _)| name == folder)
            .map(|(_, entry)| entry)
    }
}

/// Display name and category for one folder. Both are optional: an absent or
/// empty value falls back to the folder name and the first declared
/// category respectively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MappingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
