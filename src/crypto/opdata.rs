//! The `opdata01` envelope: AES-256-CBC + HMAC-SHA256 authenticated
//! encryption of an arbitrary byte payload.
//!
//! Layout of an envelope:
//!
//! ```text
//! [ "opdata01": 8 | plaintext length: u64 LE | IV: 16 | ciphertext: N | HMAC-SHA256: 32 ]
//! ```
//!
//! N is the smallest multiple of 16 strictly greater than the plaintext
//! length.  Random padding is placed *in front of* the plaintext before
//! encryption, so no block-cipher padding scheme is involved and the
//! padding bytes are never inspected on decode.  The HMAC covers every
//! byte before it.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use super::keys::KeyPair;
use crate::errors::{KeychainError, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Marker at the start of every envelope.
pub const MARKER: &[u8; 8] = b"opdata01";

/// AES block size.
const BLOCK_LEN: usize = 16;

/// Size of the IV.
const IV_LEN: usize = 16;

/// Size of the HMAC-SHA256 tag.
const MAC_LEN: usize = 32;

/// marker (8) + length (8) + IV (16).
const HEADER_LEN: usize = 32;

/// Smallest possible envelope: header, one block of ciphertext, tag.
const MIN_LEN: usize = HEADER_LEN + BLOCK_LEN + MAC_LEN;

/// Encrypt and authenticate `plaintext` under `keys`.
pub fn encode(plaintext: &[u8], keys: &KeyPair) -> Result<Vec<u8>> {
    let mut rng = rand::rng();

    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut iv);

    // Always at least one byte of padding, so an exact multiple of the
    // block size still gains a full block.
    let pad_len = BLOCK_LEN - (plaintext.len() % BLOCK_LEN);
    let padded_len = pad_len + plaintext.len();

    let mut buf = vec![0u8; padded_len];
    rng.fill_bytes(&mut buf[..pad_len]);
    buf[pad_len..].copy_from_slice(plaintext);

    let cipher = Aes256CbcEnc::new_from_slices(keys.enc_key(), &iv)
        .map_err(|e| KeychainError::EncryptionFailed(format!("invalid key length: {e}")))?;
    cipher
        .encrypt_padded_mut::<NoPadding>(&mut buf, padded_len)
        .map_err(|e| KeychainError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut out = Vec::with_capacity(HEADER_LEN + padded_len + MAC_LEN);
    out.extend_from_slice(MARKER);
    out.extend_from_slice(&(plaintext.len() as u64).to_le_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&buf);

    let tag = compute_hmac(keys, &out)?;
    out.extend_from_slice(&tag);

    Ok(out)
}

/// Verify and decrypt an envelope produced by [`encode`].
///
/// Fails with [`KeychainError::Format`] on structural problems and with
/// [`KeychainError::Integrity`] when the HMAC does not verify, which is
/// what a wrong key looks like.
pub fn decode(envelope: &[u8], keys: &KeyPair) -> Result<Vec<u8>> {
    if envelope.len() < MIN_LEN {
        return Err(KeychainError::Format(format!(
            "envelope is {} bytes, need at least {MIN_LEN}",
            envelope.len()
        )));
    }
    if &envelope[..MARKER.len()] != MARKER {
        return Err(KeychainError::Format("missing opdata01 marker".into()));
    }

    let (signed, stored_tag) = envelope.split_at(envelope.len() - MAC_LEN);
    let ciphertext = &signed[HEADER_LEN..];
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(KeychainError::Format(format!(
            "ciphertext length {} is not a multiple of {BLOCK_LEN}",
            ciphertext.len()
        )));
    }

    verify_hmac(keys, signed, stored_tag)?;

    let declared = u64::from_le_bytes(
        signed[8..16]
            .try_into()
            .map_err(|_| KeychainError::Format("bad length field".into()))?,
    );
    let plaintext_len = usize::try_from(declared)
        .ok()
        .filter(|len| *len <= ciphertext.len())
        .ok_or_else(|| {
            KeychainError::Format(format!(
                "declared length {declared} exceeds ciphertext length {}",
                ciphertext.len()
            ))
        })?;

    let iv = &signed[16..HEADER_LEN];
    let mut buf = ciphertext.to_vec();
    let cipher = Aes256CbcDec::new_from_slices(keys.enc_key(), iv)
        .map_err(|e| KeychainError::Format(format!("invalid key length: {e}")))?;
    let decrypted = cipher
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| KeychainError::Format(format!("decryption error: {e}")))?;

    let plaintext = decrypted[decrypted.len() - plaintext_len..].to_vec();
    buf.zeroize();

    Ok(plaintext)
}

/// HMAC-SHA256 over `data` keyed with the pair's HMAC half.
fn compute_hmac(keys: &KeyPair, data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(keys.hmac_key())
        .map_err(|e| KeychainError::EncryptionFailed(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time tag check via `Mac::verify_slice`.
fn verify_hmac(keys: &KeyPair, data: &[u8], expected: &[u8]) -> Result<()> {
    let mut mac = Hmac::<Sha256>::new_from_slice(keys.hmac_key())
        .map_err(|e| KeychainError::Format(format!("invalid HMAC key: {e}")))?;
    mac.update(data);
    mac.verify_slice(expected)
        .map_err(|_| KeychainError::Integrity)
}
