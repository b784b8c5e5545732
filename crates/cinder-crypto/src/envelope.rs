//! AES-256-CFB content encryption.
//!
//! The Vanish envelope is `IV || CFB(key, plaintext)`: a random 16-byte IV
//! followed by the cipher-feedback keystream XOR of the plaintext. CFB adds
//! no padding and no authentication tag, so the ciphertext is exactly 16
//! bytes longer than the plaintext. A tampered envelope simply decrypts to
//! garbage, the same outcome as an expired one.

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::RngCore;

use crate::{CryptoError, Result};

/// Content key size (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// IV size (one AES block, 16 bytes).
pub const IV_SIZE: usize = 16;

type EnvelopeEncryptor = cfb_mode::Encryptor<Aes256>;
type EnvelopeDecryptor = cfb_mode::Decryptor<Aes256>;

/// Encrypt `plaintext` under `key` with a fresh random IV.
///
/// Returns `IV || ciphertext body`.
pub fn encrypt(key: &[u8; KEY_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    encrypt_with_iv(key, &iv, plaintext)
}

/// Encrypt `plaintext` under `key` with the caller's IV.
pub fn encrypt_with_iv(key: &[u8; KEY_SIZE], iv: &[u8; IV_SIZE], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(IV_SIZE + plaintext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(plaintext);

    let cipher = EnvelopeEncryptor::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    cipher.encrypt(&mut out[IV_SIZE..]);
    Ok(out)
}

/// Decrypt an `IV || body` envelope under `key`.
///
/// # Errors
///
/// Returns [`CryptoError::CiphertextTooShort`] if the envelope cannot hold
/// an IV. A wrong key is not detected; the output is garbage.
pub fn decrypt(key: &[u8; KEY_SIZE], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < IV_SIZE {
        return Err(CryptoError::CiphertextTooShort {
            len: ciphertext.len(),
            min: IV_SIZE,
        });
    }

    let (iv, body) = ciphertext.split_at(IV_SIZE);
    let mut out = body.to_vec();

    let cipher = EnvelopeDecryptor::new_from_slices(key, iv)
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    cipher.decrypt(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [0x42u8; KEY_SIZE];
        let plaintext = b"the quick brown fox";

        let envelope = encrypt(&key, plaintext).expect("encrypt");
        assert_eq!(envelope.len(), IV_SIZE + plaintext.len());

        let decrypted = decrypt(&key, &envelope).expect("decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_iv_is_prepended() {
        let key = [0x01u8; KEY_SIZE];
        let iv = [0xA5u8; IV_SIZE];

        let envelope = encrypt_with_iv(&key, &iv, b"data").expect("encrypt");
        assert_eq!(&envelope[..IV_SIZE], &iv);
    }

    #[test]
    fn test_distinct_ivs_distinct_ciphertexts() {
        let key = [0x07u8; KEY_SIZE];
        let a = encrypt(&key, b"same plaintext").expect("encrypt");
        let b = encrypt(&key, b"same plaintext").expect("encrypt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key_garbles() {
        let envelope = encrypt(&[0x01u8; KEY_SIZE], b"plaintext").expect("encrypt");
        let garbled = decrypt(&[0x02u8; KEY_SIZE], &envelope).expect("decrypt");
        assert_ne!(garbled, b"plaintext");
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let result = decrypt(&[0u8; KEY_SIZE], &[1, 2, 3]);
        assert!(matches!(
            result,
            Err(CryptoError::CiphertextTooShort { len: 3, .. })
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = [0x11u8; KEY_SIZE];
        let envelope = encrypt(&key, b"").expect("encrypt");
        assert_eq!(envelope.len(), IV_SIZE);
        let decrypted = decrypt(&key, &envelope).expect("decrypt");
        assert!(decrypted.is_empty());
    }
}
