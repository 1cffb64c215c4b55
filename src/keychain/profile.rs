//! The `profile.js` artifact: keychain-wide parameters and the wrapped
//! master/overview keys.

use serde::{Deserialize, Serialize};

use super::format::{base64_decode, base64_encode, unwrap_text, wrap_text};
use crate::crypto::WrappedKeys;
use crate::errors::{KeychainError, Result};

/// File name of the profile artifact inside a profile folder.
pub const PROFILE_FILE: &str = "profile.js";

const PROFILE_PREFIX: &str = "var profile=";
const PROFILE_SUFFIX: &str = ";";

/// Every recognised field of `profile.js`.
///
/// Unknown fields written by other clients are ignored on read and not
/// written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uuid: String,

    /// PBKDF2 salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// Unix seconds.
    pub created_at: i64,

    /// Unix seconds.
    pub updated_at: i64,

    /// PBKDF2 iteration count.
    pub iterations: u32,

    pub profile_name: String,

    #[serde(default)]
    pub password_hint: String,

    #[serde(default)]
    pub last_updated_by: String,

    /// Raw master secret wrapped under the super key pair.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub master_key: Vec<u8>,

    /// Raw overview secret wrapped under the super key pair.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub overview_key: Vec<u8>,
}

impl Profile {
    /// Parse the text of a `profile.js` file.
    pub fn parse(text: &str) -> Result<Self> {
        let json = unwrap_text(text, PROFILE_PREFIX, PROFILE_SUFFIX)?;
        serde_json::from_str(json)
            .map_err(|e| KeychainError::Format(format!("profile JSON: {e}")))
    }

    /// Render the text of a `profile.js` file.
    pub fn to_text(&self) -> Result<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| KeychainError::SerializationError(format!("profile: {e}")))?;
        Ok(wrap_text(&json, PROFILE_PREFIX, PROFILE_SUFFIX))
    }

    pub fn wrapped_keys(&self) -> WrappedKeys {
        WrappedKeys {
            master_key: self.master_key.clone(),
            overview_key: self.overview_key.clone(),
        }
    }

    pub fn set_wrapped_keys(&mut self, wrapped: WrappedKeys) {
        self.master_key = wrapped.master_key;
        self.overview_key = wrapped.overview_key;
    }
}
