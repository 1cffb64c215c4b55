//! Password-based key derivation using PBKDF2-HMAC-SHA512.
//!
//! The 64-byte PBKDF2 output is split in half: the first 32 bytes become
//! the encryption key, the last 32 bytes the HMAC key.  The resulting
//! pair is the "super key" that unwraps the master and overview keys.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroize;

use super::keys::{KeyPair, KEY_LEN};
use crate::errors::{KeychainError, Result};

/// Length of the salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count for new keychains.
pub const DEFAULT_ITERATIONS: u32 = 2_500;

/// Derive the super key pair from a password, salt and iteration count.
///
/// The same inputs always produce the same key pair.  Nothing is cached
/// between calls.
pub fn derive_key_pair(password: &[u8], salt: &[u8], iterations: u32) -> Result<KeyPair> {
    if iterations < 1 {
        return Err(KeychainError::KeyDerivationFailed(
            "PBKDF2 iterations must be at least 1".into(),
        ));
    }

    let mut derived = [0u8; KEY_LEN * 2];
    pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut derived);

    let pair = KeyPair::from_slice(&derived);
    derived.zeroize();
    pair
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
