//! Band files: items sharded by the first hex digit of their uuid.
//!
//! `band_0.js` … `band_F.js` each hold `ld({ "<uuid>": { item }, ... });`.

use std::collections::BTreeMap;

use super::format::{unwrap_text, wrap_text};
use super::item::ItemRecord;
use crate::errors::{KeychainError, Result};

const BAND_PREFIX: &str = "ld(";
const BAND_SUFFIX: &str = ");";

/// The shard an item belongs to: the uppercase first character of its uuid.
pub fn band_id(uuid: &str) -> Result<char> {
    uuid.chars()
        .next()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_uppercase())
        .ok_or_else(|| KeychainError::Format(format!("item uuid '{uuid}' does not start with a hex digit")))
}

/// File name of the band holding shard `id`.
pub fn band_file_name(id: char) -> String {
    format!("band_{id}.js")
}

/// Parse a band file into its item records.
///
/// The map key must match the record's own uuid.
pub fn parse(text: &str) -> Result<Vec<ItemRecord>> {
    let json = unwrap_text(text, BAND_PREFIX, BAND_SUFFIX)?;
    let band: BTreeMap<String, ItemRecord> = serde_json::from_str(json)
        .map_err(|e| KeychainError::Format(format!("band JSON: {e}")))?;

    band.into_iter()
        .map(|(uuid, record)| {
            if uuid == record.uuid {
                Ok(record)
            } else {
                Err(KeychainError::Format(format!(
                    "band entry '{uuid}' holds item '{}'",
                    record.uuid
                )))
            }
        })
        .collect()
}

/// Render band files for a set of records, keyed by file name.
///
/// Only shards that hold at least one item are produced.
pub fn export<'a, I>(records: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = &'a ItemRecord>,
{
    let mut shards: BTreeMap<char, BTreeMap<&str, &ItemRecord>> = BTreeMap::new();
    for record in records {
        shards
            .entry(band_id(&record.uuid)?)
            .or_default()
            .insert(&record.uuid, record);
    }

    shards
        .into_iter()
        .map(|(id, records)| {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| KeychainError::SerializationError(format!("band {id}: {e}")))?;
            Ok((band_file_name(id), wrap_text(&json, BAND_PREFIX, BAND_SUFFIX)))
        })
        .collect()
}
