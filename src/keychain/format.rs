//! Shared helpers for the textual keychain artifacts.
//!
//! Both `profile.js` and the `band_X.js` files are JSON documents wrapped
//! in a fixed JavaScript prefix/suffix pair so they can be loaded by a
//! browser with a `<script>` tag:
//!
//! ```text
//! profile.js  : var profile={...};
//! band_0.js   : ld({...});
//! ```
//!
//! Binary fields inside the JSON (salt, envelopes) are standard base64.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::errors::{KeychainError, Result};

/// Strip `prefix` and `suffix` from an artifact, returning the JSON body.
///
/// Surrounding whitespace (a trailing newline, typically) is ignored.
pub fn unwrap_text<'a>(text: &'a str, prefix: &str, suffix: &str) -> Result<&'a str> {
    text.trim()
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .ok_or_else(|| {
            KeychainError::Format(format!(
                "artifact is not wrapped in `{prefix}` ... `{suffix}`"
            ))
        })
}

/// Wrap a JSON body in `prefix` and `suffix`.
pub fn wrap_text(json: &str, prefix: &str, suffix: &str) -> String {
    let mut out = String::with_capacity(prefix.len() + json.len() + suffix.len());
    out.push_str(prefix);
    out.push_str(json);
    out.push_str(suffix);
    out
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn base64_encode_opt<S>(
    data: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match data {
        Some(bytes) => base64_encode(bytes, serializer),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn base64_decode_opt<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    s.map(|s| BASE64.decode(&s).map_err(serde::de::Error::custom))
        .transpose()
}
