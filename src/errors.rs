use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in cloudkeychain.
#[derive(Debug, Error)]
pub enum KeychainError {
    // --- Envelope errors ---
    #[error("Invalid envelope format: {0}")]
    Format(String),

    #[error("HMAC verification failed: wrong key or tampered data")]
    Integrity,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Keychain errors ---
    #[error("Wrong master password")]
    WrongPassword,

    #[error("Keychain profile not found at {0}")]
    NotFound(PathBuf),

    #[error("Keychain already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Keychain is locked")]
    Locked,

    #[error("Item '{0}' not found")]
    ItemNotFound(String),

    #[error("Item '{uuid}' is corrupted: {reason}")]
    CorruptItem { uuid: String, reason: String },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// Convenience type alias for cloudkeychain results.
pub type Result<T> = std::result::Result<T, KeychainError>;
