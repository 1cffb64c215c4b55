//! The key-wrapping hierarchy.
//!
//! ```text
//! password ──PBKDF2──▶ super key pair
//!                          │ wraps
//!            ┌─────────────┴──────────────┐
//!   raw master secret (256 B)     raw overview secret (64 B)
//!            │ SHA-512 split               │ SHA-512 split
//!     master key pair               overview key pair
//!            │                             │ wraps
//!   item details (fallback)         raw item secret (64 B) ── SHA-512 split ──▶ item key pair
//! ```
//!
//! Only the wrapped raw secrets are ever persisted.  Changing the password
//! re-wraps the same raw secrets under a new super key pair, so the
//! master and overview keys (and therefore every item) stay untouched.

use super::keys::{KeyPair, RawSecret};
use super::opdata;
use crate::errors::Result;

/// Length of the raw master secret.
pub const MASTER_SECRET_LEN: usize = 256;

/// Length of the raw overview secret.
pub const OVERVIEW_SECRET_LEN: usize = 64;

/// Length of a raw per-item secret.
pub const ITEM_SECRET_LEN: usize = 64;

/// The persisted half of the hierarchy: both raw secrets wrapped under
/// the super key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKeys {
    pub master_key: Vec<u8>,
    pub overview_key: Vec<u8>,
}

/// The unwrapped raw secrets.  Held only for the duration of a create or
/// change-password call.
#[derive(Debug)]
pub struct RawSecrets {
    pub master: RawSecret,
    pub overview: RawSecret,
}

/// The working key pairs of an unlocked keychain.
#[derive(Debug, PartialEq, Eq)]
pub struct UnlockedKeys {
    pub master: KeyPair,
    pub overview: KeyPair,
}

impl RawSecrets {
    /// Generate fresh random master and overview secrets.
    pub fn generate() -> Self {
        Self {
            master: RawSecret::generate(MASTER_SECRET_LEN),
            overview: RawSecret::generate(OVERVIEW_SECRET_LEN),
        }
    }

    /// Derive the master and overview key pairs.
    pub fn unlocked_keys(&self) -> UnlockedKeys {
        UnlockedKeys {
            master: self.master.key_pair(),
            overview: self.overview.key_pair(),
        }
    }
}

/// Generate a new hierarchy under `super_keys`.
///
/// Returns the wrapped form to persist and the working key pairs, so a
/// freshly created keychain starts out unlocked without another
/// password round-trip.
pub fn create(super_keys: &KeyPair) -> Result<(WrappedKeys, UnlockedKeys)> {
    let raw = RawSecrets::generate();
    let wrapped = rewrap(super_keys, &raw)?;
    Ok((wrapped, raw.unlocked_keys()))
}

/// Unwrap both raw secrets.
///
/// A [`KeychainError::Integrity`](crate::errors::KeychainError::Integrity)
/// here means the super key pair is wrong, i.e. the password was wrong.
pub fn unwrap(super_keys: &KeyPair, wrapped: &WrappedKeys) -> Result<RawSecrets> {
    let master = RawSecret::from_bytes(opdata::decode(&wrapped.master_key, super_keys)?);
    let overview = RawSecret::from_bytes(opdata::decode(&wrapped.overview_key, super_keys)?);
    Ok(RawSecrets { master, overview })
}

/// Wrap already-known raw secrets under a (new) super key pair.
pub fn rewrap(super_keys: &KeyPair, raw: &RawSecrets) -> Result<WrappedKeys> {
    Ok(WrappedKeys {
        master_key: opdata::encode(raw.master.as_bytes(), super_keys)?,
        overview_key: opdata::encode(raw.overview.as_bytes(), super_keys)?,
    })
}

/// Generate a per-item key pair and its wrapped form under the overview
/// key pair.
pub fn new_item_key(overview: &KeyPair) -> Result<(KeyPair, Vec<u8>)> {
    let raw = RawSecret::generate(ITEM_SECRET_LEN);
    let wrapped = opdata::encode(raw.as_bytes(), overview)?;
    Ok((raw.key_pair(), wrapped))
}

/// Recover a per-item key pair from its wrapped form.
pub fn unwrap_item_key(overview: &KeyPair, wrapped: &[u8]) -> Result<KeyPair> {
    let raw = RawSecret::from_bytes(opdata::decode(wrapped, overview)?);
    Ok(raw.key_pair())
}
