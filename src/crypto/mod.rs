//! Cryptographic primitives for cloudkeychain.
//!
//! This module provides:
//! - PBKDF2-HMAC-SHA512 password-based key derivation (`kdf`)
//! - Key pair and raw secret types (`keys`)
//! - The `opdata01` authenticated envelope codec (`opdata`)
//! - The master/overview/item key-wrapping hierarchy (`hierarchy`)

pub mod hierarchy;
pub mod kdf;
pub mod keys;
pub mod opdata;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encode, decode, derive_key_pair, ...};
pub use hierarchy::{RawSecrets, UnlockedKeys, WrappedKeys};
pub use kdf::{derive_key_pair, generate_salt, DEFAULT_ITERATIONS};
pub use keys::{KeyPair, RawSecret};
pub use opdata::{decode, encode};
