use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::error::{init::InitError, internal::InternalError};

const NONCE_LEN: usize = 12;

/// Encrypts and decrypts stored provider API keys with AES-256-GCM.
///
/// The wire format is `base64(nonce || ciphertext)`.
#[derive(Clone)]
pub struct KeyEncryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for KeyEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyEncryptor(*****)")
    }
}

impl KeyEncryptor {
    /// Builds an encryptor from a 64-hex-character (256-bit) key.
    pub fn from_hex_key(hex_key: &str) -> Result<Self, InitError> {
        let key_bytes =
            decode_hex(hex_key).ok_or(InitError::InvalidEncryptionKey)?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|_| InitError::InvalidEncryptionKey)?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, InternalError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| InternalError::DecryptionFailure)?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, InternalError> {
        let raw = BASE64
            .decode(encoded)
            .map_err(|_| InternalError::DecryptionFailure)?;
        if raw.len() <= NONCE_LEN {
            return Err(InternalError::DecryptionFailure);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| InternalError::DecryptionFailure)?;
        String::from_utf8(plaintext)
            .map_err(|_| InternalError::DecryptionFailure)
    }
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }
    (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(input.get(i..i + 2)?, 16).ok())
        .collect()
}
