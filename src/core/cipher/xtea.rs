// src/core/cipher/xtea.rs

use super::{Cipher, pad, unpad};

const ROUNDS: u32 = 32;
const BLOCK_SIZE: usize = 8;
const DELTA: u32 = 0x9E37_79B9;
const DECRYPT_SUM: u32 = 0xC6EF_3720; // DELTA * ROUNDS, wrapped

/// The Extended Tiny Encryption Algorithm: a 32-round Feistel cipher over
/// 64-bit blocks with a 128-bit key.
///
/// Key material of any length is accepted; it is digested with MD5 and the
/// 16-byte digest becomes the working key. Plaintext is padded with the
/// RFC-1423 scheme before encryption.
#[derive(Debug, Default)]
pub struct XteaCipher {
    subkeys: Option<[u32; 4]>,
}

impl XteaCipher {
    pub fn new() -> Self {
        Self::default()
    }

    fn subkeys(&self) -> &[u32; 4] {
        self.subkeys
            .as_ref()
            .expect("cipher used before init() was called")
    }
}

/// Derive the four 32-bit subkeys from arbitrary key material.
fn generate_subkeys(key: &[u8]) -> [u32; 4] {
    let digest = md5::compute(key);
    let mut subkeys = [0u32; 4];
    for (i, chunk) in digest.0.chunks_exact(4).enumerate() {
        subkeys[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    subkeys
}

fn encrypt_block(block: &[u8], subkeys: &[u32; 4]) -> [u8; BLOCK_SIZE] {
    let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    let mut sum: u32 = 0;

    for _ in 0..ROUNDS {
        v0 = v0.wrapping_add(
            ((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)
                ^ sum.wrapping_add(subkeys[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            ((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)
                ^ sum.wrapping_add(subkeys[((sum >> 11) & 3) as usize]),
        );
    }

    let mut out = [0u8; BLOCK_SIZE];
    out[..4].copy_from_slice(&v0.to_be_bytes());
    out[4..].copy_from_slice(&v1.to_be_bytes());
    out
}

fn decrypt_block(block: &[u8], subkeys: &[u32; 4]) -> [u8; BLOCK_SIZE] {
    let mut v0 = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
    let mut v1 = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
    let mut sum: u32 = DECRYPT_SUM;

    for _ in 0..ROUNDS {
        v1 = v1.wrapping_sub(
            ((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)
                ^ sum.wrapping_add(subkeys[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            ((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1)
                ^ sum.wrapping_add(subkeys[(sum & 3) as usize]),
        );
    }

    let mut out = [0u8; BLOCK_SIZE];
    out[..4].copy_from_slice(&v0.to_be_bytes());
    out[4..].copy_from_slice(&v1.to_be_bytes());
    out
}

impl Cipher for XteaCipher {
    fn init(&mut self, key: &[u8]) {
        self.subkeys = Some(generate_subkeys(key));
    }

    fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        let subkeys = self.subkeys();
        let padded = pad(data, BLOCK_SIZE);
        let mut retval = Vec::with_capacity(padded.len());
        for block in padded.chunks_exact(BLOCK_SIZE) {
            retval.extend_from_slice(&encrypt_block(block, subkeys));
        }
        retval
    }

    fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        let subkeys = self.subkeys();
        let mut retval = Vec::with_capacity(data.len());
        for block in data.chunks_exact(BLOCK_SIZE) {
            retval.extend_from_slice(&decrypt_block(block, subkeys));
        }
        unpad(retval)
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn name(&self) -> &'static str {
        "XTEA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut cipher = XteaCipher::new();
        cipher.init(b"poodles");
        let text = b"This is a test of the XTEA encryption algorithm";
        let encrypted = cipher.encrypt(text);
        assert_ne!(&encrypted[..text.len().min(encrypted.len())], &text[..]);
        assert_eq!(cipher.decrypt(&encrypted), text);
    }

    #[test]
    fn test_block_aligned_input_gains_full_padding_block() {
        let mut cipher = XteaCipher::new();
        cipher.init(b"key");
        let text = [0x42u8; 16];
        let encrypted = cipher.encrypt(&text);
        assert_eq!(encrypted.len(), 24);
        assert_eq!(cipher.decrypt(&encrypted), text);
    }

    #[test]
    fn test_deterministic_for_a_given_key() {
        let mut a = XteaCipher::new();
        let mut b = XteaCipher::new();
        a.init(b"same key");
        b.init(b"same key");
        assert_eq!(a.encrypt(b"payload"), b.encrypt(b"payload"));
    }

    #[test]
    fn test_different_keys_differ() {
        let mut a = XteaCipher::new();
        let mut b = XteaCipher::new();
        a.init(b"key one");
        b.init(b"key two");
        assert_ne!(a.encrypt(b"payload"), b.encrypt(b"payload"));
    }
}
