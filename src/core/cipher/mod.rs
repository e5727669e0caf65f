// src/core/cipher/mod.rs

//! Symmetric ciphers used to obfuscate values in configuration files.
//!
//! This is not intended to be state-of-the-art encryption, but a set of
//! portable algorithms adequate for keeping secrets out of plain sight in
//! property files. Ciphertext is armored as base-32 text so it survives
//! transport through line-oriented configuration.

mod null;
mod xtea;

pub use null::NullCipher;
pub use xtea::XteaCipher;

use data_encoding::BASE32;
use lazy_static::lazy_static;
use std::collections::HashMap;
use thiserror::Error;

/// The built-in secret used when no key is supplied by the caller.
const DEFAULT_SECRET: &str = "cliqsecret";

/// The algorithm used by `encrypt_token` / `decrypt_token`.
pub const DEFAULT_CIPHER: &str = "xtea";

#[derive(Error, Debug)]
pub enum CipherError {
    #[error("No cipher registered under the name '{0}'")]
    UnknownCipher(String),
    #[error("Ciphertext is not valid base-32 armor: {0}")]
    Armor(#[from] data_encoding::DecodeError),
    #[error("Decrypted bytes are not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A stateful, single-use encryptor/decryptor.
///
/// Handles must be initialized with key material before `encrypt` or
/// `decrypt` is called, and must never be shared once initialized; acquire a
/// fresh handle from the registry for every use.
pub trait Cipher: Send {
    /// Set the key material for all subsequent operations.
    fn init(&mut self, key: &[u8]);

    /// Encrypt the given data. Deterministic for a given key.
    fn encrypt(&self, data: &[u8]) -> Vec<u8>;

    /// The inverse of `encrypt`.
    fn decrypt(&self, data: &[u8]) -> Vec<u8>;

    /// The block size callers should align data to. May be zero.
    fn block_size(&self) -> usize;

    /// The registry name of the algorithm.
    fn name(&self) -> &'static str;
}

type CipherFactory = fn() -> Box<dyn Cipher>;

/// A mapping from algorithm name to a factory yielding fresh, uninitialized
/// cipher handles.
pub struct CipherRegistry {
    factories: HashMap<String, CipherFactory>,
}

impl CipherRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("Null", || Box::new(NullCipher));
        registry.register("XTEA", || Box::new(XteaCipher::new()));
        registry
    }

    /// Register a factory under a case-insensitive name.
    pub fn register(&mut self, name: &str, factory: CipherFactory) {
        self.factories.insert(name.to_lowercase(), factory);
    }

    /// Produce a fresh, uninitialized handle for the named algorithm.
    pub fn get(&self, name: &str) -> Result<Box<dyn Cipher>, CipherError> {
        self.factories
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| CipherError::UnknownCipher(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for CipherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref REGISTRY: CipherRegistry = CipherRegistry::new();
}

/// Pad data to a multiple of the block size (RFC-1423 scheme): append `k`
/// bytes each of value `k` where `k` is in `[1, block_size]`. Data that is
/// already block-aligned receives a full block of padding.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let mut padding = block_size - (data.len() % block_size);
    if padding == 0 {
        padding = block_size;
    }
    let mut retval = Vec::with_capacity(data.len() + padding);
    retval.extend_from_slice(data);
    retval.resize(data.len() + padding, padding as u8);
    retval
}

/// Strip RFC-1423 padding: the final byte holds the pad count; strip that
/// many trailing bytes when it is in `[1, 8]`.
pub fn unpad(mut data: Vec<u8>) -> Vec<u8> {
    if let Some(&last) = data.last() {
        let count = last as usize;
        if (1..=8).contains(&count) && count <= data.len() {
            data.truncate(data.len() - count);
        }
    }
    data
}

/// Encrypt a text token with the default cipher and secret, returning the
/// base-32 armored ciphertext suitable for a property file.
pub fn encrypt_token(token: &str) -> Result<String, CipherError> {
    let mut cipher = REGISTRY.get(DEFAULT_CIPHER)?;
    cipher.init(DEFAULT_SECRET.as_bytes());
    let cipherdata = cipher.encrypt(token.as_bytes());
    Ok(BASE32.encode(&cipherdata))
}

/// De-armor and decrypt a token produced by `encrypt_token`.
pub fn decrypt_token(ciphertext: &str) -> Result<String, CipherError> {
    let mut cipher = REGISTRY.get(DEFAULT_CIPHER)?;
    cipher.init(DEFAULT_SECRET.as_bytes());
    let cipherdata = BASE32.decode(ciphertext.as_bytes())?;
    let cleardata = cipher.decrypt(&cipherdata);
    Ok(String::from_utf8(cleardata)?)
}

/// Produce a fresh handle for the named algorithm from the process-wide
/// registry.
pub fn get_cipher(name: &str) -> Result<Box<dyn Cipher>, CipherError> {
    REGISTRY.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_law() {
        for len in 0..=24 {
            let data = vec![0x41u8; len];
            let padded = pad(&data, 8);
            assert_eq!(padded.len() % 8, 0);
            let added = padded.len() - data.len();
            assert!((1..=8).contains(&added));
            assert_eq!(unpad(padded), data);
        }
    }

    #[test]
    fn test_registry_yields_fresh_handles() {
        let registry = CipherRegistry::new();
        let a = registry.get("xtea").unwrap();
        let b = registry.get("XTEA").unwrap();
        assert_eq!(a.name(), b.name());
        assert!(registry.get("rot13").is_err());
    }

    #[test]
    fn test_round_trip_all_registered() {
        let registry = CipherRegistry::new();
        for name in registry.names() {
            let mut cipher = registry.get(name).unwrap();
            cipher.init(b"a test key");
            let plain = b"This is a Test".to_vec();
            let encrypted = cipher.encrypt(&plain);
            assert_eq!(cipher.decrypt(&encrypted), plain, "cipher {}", name);
        }
    }

    #[test]
    fn test_block_cipher_pads_to_block_size() {
        let mut cipher = get_cipher("xtea").unwrap();
        cipher.init(b"key");
        let plain = b"This is a Test";
        let encrypted = cipher.encrypt(plain);
        assert_eq!(encrypted.len() % cipher.block_size(), 0);
        let added = encrypted.len() - plain.len();
        assert!(added >= 1 && added <= cipher.block_size());
    }

    #[test]
    fn test_token_round_trip() {
        let armored = encrypt_token("This is a Test").unwrap();
        // armor must survive a text property file
        assert!(armored.is_ascii());
        assert_eq!(decrypt_token(&armored).unwrap(), "This is a Test");
    }

    #[test]
    fn test_decrypt_token_rejects_bad_armor() {
        assert!(decrypt_token("not base32 at all!").is_err());
    }
}
