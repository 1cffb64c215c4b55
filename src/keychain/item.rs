//! Keychain items.
//!
//! An [`ItemRecord`] is the persisted form: a few plaintext attributes
//! plus three envelopes (`o` overview, `d` details, optional `k` item
//! key).  An [`Item`] wraps a record together with its decrypted caches.
//! The overview is decrypted eagerly on unlock; the details are
//! decrypted lazily the first time they are asked for.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;
use zeroize::Zeroize;

use super::format::{base64_decode, base64_decode_opt, base64_encode, base64_encode_opt};
use crate::crypto::hierarchy::{self, UnlockedKeys};
use crate::crypto::{opdata, KeyPair};
use crate::errors::{KeychainError, Result};

/// Category code for logins.
pub const LOGIN_CATEGORY: &str = "001";

fn default_category() -> String {
    LOGIN_CATEGORY.to_string()
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Generate a new item identifier: 32 uppercase hex digits.
pub fn new_uuid() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

/// The persisted form of an item, as found in a band file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub uuid: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// Unix seconds.
    pub created: i64,

    /// Unix seconds.
    pub updated: i64,

    /// Unix seconds of the last write transaction.
    #[serde(default)]
    pub tx: i64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub trashed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fave: Option<u64>,

    /// Overview envelope under the overview key pair.
    #[serde(
        rename = "o",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub overview: Vec<u8>,

    /// Details envelope under the item key pair (or the master key pair
    /// when `key` is absent).
    #[serde(
        rename = "d",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub details: Vec<u8>,

    /// Raw item secret wrapped under the overview key pair.
    #[serde(
        rename = "k",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "base64_encode_opt",
        deserialize_with = "base64_decode_opt"
    )]
    pub key: Option<Vec<u8>>,
}

/// Decrypted overview: the fields needed for listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Anything else the writer put in the overview.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Overview {
    fn scrub(&mut self) {
        self.title.zeroize();
        self.url.zeroize();
        self.tags.zeroize();
        for value in self.extra.values_mut() {
            scrub_value(value);
        }
        self.extra.clear();
    }
}

/// Input for a new login item.
///
/// Wrap it in `Zeroizing` when it holds a real password.
#[derive(Debug, Clone, Default, Zeroize)]
pub struct NewItem {
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl NewItem {
    fn overview(&self) -> Overview {
        Overview {
            title: self.title.clone(),
            url: self.url.clone(),
            tags: self.tags.clone(),
            extra: Map::new(),
        }
    }

    fn details(&self) -> Value {
        let mut details = json!({
            "fields": [
                {
                    "designation": "username",
                    "name": "username",
                    "type": "T",
                    "value": self.username,
                },
                {
                    "designation": "password",
                    "name": "password",
                    "type": "P",
                    "value": self.password,
                },
            ],
        });
        if let Some(notes) = &self.notes {
            details["notesPlain"] = Value::String(notes.clone());
        }
        details
    }
}

/// An item plus its decrypted caches.
#[derive(Debug)]
pub struct Item {
    record: ItemRecord,
    overview: Option<Overview>,
    details: Option<Value>,
}

impl Item {
    /// Wrap a persisted record; nothing is decrypted yet.
    pub fn from_record(record: ItemRecord) -> Self {
        Self {
            record,
            overview: None,
            details: None,
        }
    }

    /// Encrypt a brand-new item under `keys`.
    ///
    /// A fresh item key is generated and wrapped under the overview key
    /// pair; the details are encrypted under that item key.
    pub fn create(data: &NewItem, keys: &UnlockedKeys, now: i64) -> Result<Self> {
        let record = ItemRecord {
            uuid: new_uuid(),
            category: default_category(),
            created: now,
            updated: now,
            tx: now,
            trashed: false,
            folder: None,
            fave: None,
            overview: Vec::new(),
            details: Vec::new(),
            key: None,
        };
        let mut item = Self::from_record(record);
        item.seal(data.overview(), data.details(), keys, now)?;
        Ok(item)
    }

    /// Replace the overview and details with new content.
    pub fn update(&mut self, data: &NewItem, keys: &UnlockedKeys, now: i64) -> Result<()> {
        self.seal(data.overview(), data.details(), keys, now)
    }

    fn seal(
        &mut self,
        overview: Overview,
        details: Value,
        keys: &UnlockedKeys,
        now: i64,
    ) -> Result<()> {
        let mut overview_json = serde_json::to_vec(&overview)
            .map_err(|e| KeychainError::SerializationError(format!("overview: {e}")))?;
        let mut details_json = serde_json::to_vec(&details)
            .map_err(|e| KeychainError::SerializationError(format!("details: {e}")))?;

        let (item_keys, wrapped_key) = hierarchy::new_item_key(&keys.overview)?;
        let sealed_overview = opdata::encode(&overview_json, &keys.overview);
        let sealed_details = opdata::encode(&details_json, &item_keys);
        overview_json.zeroize();
        details_json.zeroize();

        self.record.overview = sealed_overview?;
        self.record.details = sealed_details?;
        self.record.key = Some(wrapped_key);
        self.record.updated = now;
        self.record.tx = now;

        self.lock();
        self.overview = Some(overview);
        self.details = Some(details);
        Ok(())
    }

    /// Decrypt and cache the overview.
    ///
    /// The keychain keys have already been verified by the time this
    /// runs, so any failure is reported as item corruption.
    pub fn unlock_overview(&mut self, overview_keys: &KeyPair) -> Result<()> {
        let mut plaintext = opdata::decode(&self.record.overview, overview_keys)
            .map_err(|e| self.corrupt(format!("overview: {e}")))?;
        let parsed = serde_json::from_slice(&plaintext);
        plaintext.zeroize();

        let overview: Overview = parsed.map_err(|e| self.corrupt(format!("overview JSON: {e}")))?;
        self.overview = Some(overview);
        Ok(())
    }

    /// Decrypted details, decrypting and caching them on first access.
    pub fn details(&mut self, keys: &UnlockedKeys) -> Result<&Value> {
        if self.details.is_none() {
            let details = self.decrypt_details(keys)?;
            self.details = Some(details);
        }
        self.details
            .as_ref()
            .ok_or_else(|| self.corrupt("details cache empty".into()))
    }

    fn decrypt_details(&self, keys: &UnlockedKeys) -> Result<Value> {
        let plaintext = match &self.record.key {
            Some(wrapped) => {
                let item_keys = hierarchy::unwrap_item_key(&keys.overview, wrapped)
                    .map_err(|e| self.corrupt(format!("item key: {e}")))?;
                opdata::decode(&self.record.details, &item_keys)
            }
            None => opdata::decode(&self.record.details, &keys.master),
        };
        let mut plaintext = plaintext.map_err(|e| self.corrupt(format!("details: {e}")))?;
        let parsed = serde_json::from_slice(&plaintext);
        plaintext.zeroize();

        parsed.map_err(|e| self.corrupt(format!("details JSON: {e}")))
    }

    /// Wipe every decrypted field.
    pub fn lock(&mut self) {
        if let Some(mut overview) = self.overview.take() {
            overview.scrub();
        }
        if let Some(mut details) = self.details.take() {
            scrub_value(&mut details);
        }
    }

    fn corrupt(&self, reason: String) -> KeychainError {
        KeychainError::CorruptItem {
            uuid: self.record.uuid.clone(),
            reason,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn uuid(&self) -> &str {
        &self.record.uuid
    }

    pub fn record(&self) -> &ItemRecord {
        &self.record
    }

    /// The decrypted overview, if the keychain is unlocked.
    pub fn overview(&self) -> Option<&Overview> {
        self.overview.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.overview.as_ref().map(|o| o.title.as_str())
    }

    pub fn is_trashed(&self) -> bool {
        self.record.trashed
    }

    pub(crate) fn set_trashed(&mut self, trashed: bool, now: i64) {
        self.record.trashed = trashed;
        self.record.updated = now;
        self.record.tx = now;
    }

    /// `true` when either cache holds plaintext.
    pub fn has_decrypted_fields(&self) -> bool {
        self.overview.is_some() || self.details.is_some()
    }

    /// `true` when the details have been decrypted and cached.
    pub fn details_cached(&self) -> bool {
        self.details.is_some()
    }
}

/// Zero every string inside a JSON value.
fn scrub_value(value: &mut Value) {
    match value {
        Value::String(s) => s.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(scrub_value),
        Value::Object(map) => map.values_mut().for_each(scrub_value),
        _ => {}
    }
}
