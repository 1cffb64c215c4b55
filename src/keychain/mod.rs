//! Keychain module: the cloud keychain format and its lock state machine.
//!
//! This module provides:
//! - `profile.js` and `band_X.js` codecs (`profile`, `band`, `format`)
//! - Items with lazily decrypted overview/details (`item`)
//! - The `Keychain` aggregate: create, load, unlock, lock, change password (`store`)
//! - Auto-lock deadline bookkeeping and a background checker (`session`, `watchdog`)
//! - Reading and writing the profile folder (`files`)

pub mod band;
pub mod files;
pub mod format;
pub mod item;
pub mod profile;
pub mod session;
pub mod store;
pub mod watchdog;

// Re-export the most commonly used items.
pub use item::{Item, ItemRecord, NewItem, Overview};
pub use profile::Profile;
pub use store::{Keychain, KeychainSettings, LockEvent, State, DEFAULT_PROFILE};
pub use watchdog::AutoLockWatchdog;
