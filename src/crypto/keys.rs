//! Key pair and raw secret types.
//!
//! Every key in the hierarchy is a pair: a 32-byte AES-256 key and a
//! 32-byte HMAC-SHA256 key.  The master, overview and per-item pairs are
//! derived from random raw secrets by hashing them with SHA-512 and
//! splitting the digest in half.

use std::fmt;

use rand::RngCore;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{KeychainError, Result};

/// Length of each half of a key pair (256 bits).
pub const KEY_LEN: usize = 32;

/// An (encryption, HMAC) key pair that zeroes its memory when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    enc: [u8; KEY_LEN],
    hmac: [u8; KEY_LEN],
}

impl KeyPair {
    /// Create a key pair from its two halves.
    pub fn new(enc: [u8; KEY_LEN], hmac: [u8; KEY_LEN]) -> Self {
        Self { enc, hmac }
    }

    /// Split a 64-byte buffer into (enc, hmac).
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN * 2 {
            return Err(KeychainError::KeyDerivationFailed(format!(
                "key material must be {} bytes, got {}",
                KEY_LEN * 2,
                bytes.len()
            )));
        }

        let mut enc = [0u8; KEY_LEN];
        let mut hmac = [0u8; KEY_LEN];
        enc.copy_from_slice(&bytes[..KEY_LEN]);
        hmac.copy_from_slice(&bytes[KEY_LEN..]);
        Ok(Self { enc, hmac })
    }

    /// Derive a key pair from a raw secret: SHA-512(raw) split in half.
    pub fn from_raw_secret(raw: &[u8]) -> Self {
        let mut digest = Sha512::digest(raw);

        let mut enc = [0u8; KEY_LEN];
        let mut hmac = [0u8; KEY_LEN];
        enc.copy_from_slice(&digest[..KEY_LEN]);
        hmac.copy_from_slice(&digest[KEY_LEN..]);
        digest.as_mut_slice().zeroize();

        Self { enc, hmac }
    }

    /// The AES-256 key.
    pub fn enc_key(&self) -> &[u8; KEY_LEN] {
        &self.enc
    }

    /// The HMAC-SHA256 key.
    pub fn hmac_key(&self) -> &[u8; KEY_LEN] {
        &self.hmac
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        let enc_eq = self.enc[..].ct_eq(&other.enc[..]);
        let hmac_eq = self.hmac[..].ct_eq(&other.hmac[..]);
        (enc_eq & hmac_eq).into()
    }
}

impl Eq for KeyPair {}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyPair(<redacted>)")
    }
}

/// A random raw secret buffer (master, overview or item key material).
///
/// Never persisted in this form; only ever stored wrapped in an envelope.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct RawSecret(Vec<u8>);

impl RawSecret {
    /// Generate `len` random bytes.
    pub fn generate(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Take ownership of already-unwrapped bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key pair this secret stands for.
    pub fn key_pair(&self) -> KeyPair {
        KeyPair::from_raw_secret(&self.0)
    }
}

impl fmt::Debug for RawSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSecret({} bytes)", self.0.len())
    }
}
