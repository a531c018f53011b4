//! Per-value authenticated encryption
//!
//! Format of one encrypted value (before base64):
//! - nonce: 24 bytes (XChaCha20-Poly1305)
//! - ciphertext: AEAD output (= ciphertext + 16-byte tag)
//!
//! The whole thing is encoded with the standard base64 alphabet, which never
//! produces `:` or a newline, so it fits in one `name:value` line.

use crate::error::{Error, Result};
use crate::key::Key;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

/// Nonce length (XChaCha20-Poly1305 uses 24 bytes)
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length
pub const TAG_LEN: usize = 16;

/// Encrypt a plaintext string under `key` with a fresh random nonce
pub fn encrypt(plaintext: &str, key: &Key) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| Error::EncryptionFailed(e.to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(sealed))
}

/// Decrypt a value produced by [`encrypt`]
///
/// Any failure (bad base64, truncated input, wrong key, tampering, non UTF-8
/// plaintext) is `DecryptionFailed`; no partial plaintext is ever returned.
pub fn decrypt(ciphertext: &str, key: &Key) -> Result<String> {
    let sealed = BASE64
        .decode(ciphertext.trim())
        .map_err(|e| Error::DecryptionFailed(format!("invalid encoding: {}", e)))?;

    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::DecryptionFailed(format!(
            "ciphertext too short: {} bytes",
            sealed.len()
        )));
    }

    let (nonce, body) = sealed.split_at(NONCE_LEN);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), body)
        .map_err(|_| Error::DecryptionFailed("authentication failed".to_string()))?;

    String::from_utf8(plaintext).map_err(|e| {
        e.into_bytes().zeroize();
        Error::DecryptionFailed("plaintext is not valid UTF-8".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(byte: u8) -> Key {
        Key::from_bytes(&[byte; crate::key::KEY_LEN]).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = Key::generate().unwrap();
        for plaintext in ["", "alice", "s3cret:with:colons", "multi\nline", "πάσσγουορντ 🔑"] {
            let encrypted = encrypt(plaintext, &key).unwrap();
            assert_eq!(decrypt(&encrypted, &key).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_ciphertexts_differ_across_calls() {
        let key = test_key(1);
        let a = encrypt("same value", &key).unwrap();
        let b = encrypt("same value", &key).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_is_line_safe() {
        let key = test_key(2);
        let encrypted = encrypt("line one\nline two: three\r\n", &key).unwrap();
        assert!(!encrypted.contains(':'));
        assert!(!encrypted.contains('\n'));
        assert!(!encrypted.contains('\r'));
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt("hunter2", &test_key(3)).unwrap();
        let result = decrypt(&encrypted, &test_key(4));
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_every_character_flip_detected() {
        let key = test_key(5);
        let encrypted = encrypt("s3cret", &key).unwrap();

        for i in 0..encrypted.len() {
            let mut chars: Vec<char> = encrypted.chars().collect();
            chars[i] = if chars[i] == 'A' { 'B' } else { 'A' };
            let tampered: String = chars.into_iter().collect();

            let result = decrypt(&tampered, &key);
            assert!(
                matches!(result, Err(Error::DecryptionFailed(_))),
                "flip at {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_every_byte_flip_detected() {
        let key = test_key(6);
        let raw = BASE64.decode(encrypt("s3cret", &key).unwrap()).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let result = decrypt(&BASE64.encode(&tampered), &key);
            assert!(matches!(result, Err(Error::DecryptionFailed(_))));
        }
    }

    #[test]
    fn test_truncated_fails() {
        let key = test_key(7);
        let raw = BASE64.decode(encrypt("value", &key).unwrap()).unwrap();

        let short = BASE64.encode(&raw[..NONCE_LEN + TAG_LEN - 1]);
        assert!(matches!(decrypt(&short, &key), Err(Error::DecryptionFailed(_))));

        let clipped = BASE64.encode(&raw[..raw.len() - 1]);
        assert!(matches!(decrypt(&clipped, &key), Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_not_base64_fails() {
        let result = decrypt("this is not base64!", &test_key(8));
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_surrounding_whitespace_tolerated() {
        let key = test_key(9);
        let encrypted = encrypt("value", &key).unwrap();
        assert_eq!(decrypt(&format!("{}\r", encrypted), &key).unwrap(), "value");
    }
}
