use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("cipher key must be 32 bytes, hex or base64 encoded")]
    InvalidKey,

    #[error("ciphertext is malformed or was produced with a different key")]
    Decrypt,

    #[error("encryption failed")]
    Encrypt,
}

/// AES-256-GCM codec for the password ciphertexts held by the system of
/// record. The nonce is generated per encryption and prepended to the
/// ciphertext; the whole blob is base64.
#[derive(Clone)]
pub struct PasswordCipher {
    key: [u8; 32],
}

impl PasswordCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Accepts a 64-char hex string or a base64 string decoding to 32 bytes.
    pub fn from_key_str(value: &str) -> Result<Self, CipherError> {
        let bytes = if value.len() == 64 {
            hex::decode(value).map_err(|_| CipherError::InvalidKey)?
        } else {
            BASE64.decode(value).map_err(|_| CipherError::InvalidKey)?
        };
        let key: [u8; 32] = bytes.try_into().map_err(|_| CipherError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// Fresh random key, hex encoded for configuration files.
    pub fn generate_key() -> String {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        hex::encode(key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, CipherError> {
        let blob = BASE64.decode(encoded).map_err(|_| CipherError::Decrypt)?;
        if blob.len() < NONCE_LEN {
            return Err(CipherError::Decrypt);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt)
    }
}

impl std::fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_recovers_plaintext() {
        let cipher = PasswordCipher::from_key_str(&PasswordCipher::generate_key()).unwrap();

        let encoded = cipher.encrypt("hunter2").unwrap();
        assert_eq!(cipher.decrypt(&encoded).unwrap(), "hunter2");
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let cipher = PasswordCipher::new([7u8; 32]);

        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypting_with_the_wrong_key_fails() {
        let a = PasswordCipher::new([1u8; 32]);
        let b = PasswordCipher::new([2u8; 32]);

        let encoded = a.encrypt("secret").unwrap();
        assert!(matches!(b.decrypt(&encoded), Err(CipherError::Decrypt)));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        let cipher = PasswordCipher::new([0u8; 32]);
        assert!(cipher.decrypt("not base64!!!").is_err());
        assert!(cipher.decrypt("").is_err());

        assert!(PasswordCipher::from_key_str("too-short").is_err());
        assert!(PasswordCipher::from_key_str(&"ab".repeat(16)).is_err());
    }

    #[test]
    fn key_string_accepts_hex_and_base64() {
        let key = [9u8; 32];
        let hex_key = hex::encode(key);
        let b64_key = BASE64.encode(key);

        let from_hex = PasswordCipher::from_key_str(&hex_key).unwrap();
        let from_b64 = PasswordCipher::from_key_str(&b64_key).unwrap();

        let encoded = from_hex.encrypt("x").unwrap();
        assert_eq!(from_b64.decrypt(&encoded).unwrap(), "x");
    }
}
