//! Persisted document shapes.
//!
//! Every collection is stored as a versioned envelope. Items are parsed one
//! at a time so a single malformed entry is skipped with a warning instead
//! of failing the whole load. Every field of every document defaults when
//! missing; conversion into domain types happens once, here.
mod active;
mod catalog;
mod cursed;
mod ensemble;

pub use active::{ActiveDocument, ActiveSnapshot};
pub use catalog::{GagItemDocument, RestrictionDocument};
pub use cursed::CursedDocument;
pub use ensemble::{EnsembleDocument, LayerDocument, SlotDocument};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{RepositoryError, Result};

/// Current schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Versioned envelope around one persisted collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "schema_version")]
    pub version: u32,
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T: Serialize> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            version: SCHEMA_VERSION,
            items,
        }
    }
}

/// Parses a collection envelope, skipping items that fail to parse.
pub fn parse_collection<T: DeserializeOwned>(name: &str, json: &str) -> Result<Vec<T>> {
    let raw: Collection<serde_json::Value> = serde_json::from_str(json)?;
    if raw.version > SCHEMA_VERSION {
        return Err(RepositoryError::UnsupportedVersion {
            collection: name.to_owned(),
            found: raw.version,
        });
    }

    let mut items = Vec::with_capacity(raw.items.len());
    for (index, value) in raw.items.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(err) => {
                tracing::warn!(collection = name, index, error = %err, "skipping unreadable entry");
            }
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Item {
        value: u32,
    }

    #[test]
    fn malformed_items_are_skipped() {
        let json =
            r#"{ "version": 1, "items": [ { "value": 1 }, { "value": "x" }, { "value": 3 } ] }"#;
        let items: Vec<Item> = parse_collection("test", json).unwrap();
        assert_eq!(items, vec![Item { value: 1 }, Item { value: 3 }]);
    }

    #[test]
    fn missing_envelope_fields_default() {
        let items: Vec<Item> = parse_collection("test", "{}").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let result = parse_collection::<Item>("test", r#"{ "version": 99 }"#);
        assert!(matches!(
            result,
            Err(RepositoryError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
