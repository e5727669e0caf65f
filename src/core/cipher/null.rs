// src/core/cipher/null.rs

use super::Cipher;

/// A passthrough cipher for deployments where encryption technologies are
/// not permitted. Returns its input unchanged.
#[derive(Debug, Default)]
pub struct NullCipher;

impl Cipher for NullCipher {
    fn init(&mut self, _key: &[u8]) {}

    fn encrypt(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decrypt(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn block_size(&self) -> usize {
        8 // pretend to be a block cipher
    }

    fn name(&self) -> &'static str {
        "Null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let mut cipher = NullCipher;
        cipher.init(b"ignored");
        let data = b"clear text".to_vec();
        assert_eq!(cipher.encrypt(&data), data);
        assert_eq!(cipher.decrypt(&data), data);
    }
}
