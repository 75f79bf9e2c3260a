//! `"chacha20"` registry entry: a stream cipher wrapping
//! [`crate::rng::chacha20`]'s keystream function.
//!
//! Reports `block_bytes = 1` (a stream cipher) and defines an IV: the
//! 12-byte nonce plus the running 32-bit block counter, exposed through
//! `set_iv`/`get_iv` as a single 16-byte buffer (nonce followed by the
//! big-endian counter) so the registry's IV contract stays uniform across
//! block and stream algorithms.

use super::{CipherError, CipherInstance};
use crate::rng::chacha20;

const KEY_BYTES: usize = 32;
const IV_BYTES: usize = 16;

pub(super) struct ChaCha20Cipher {
    key: [u8; KEY_BYTES],
    nonce: [u8; 12],
    counter: u32,
}

impl ChaCha20Cipher {
    /// `for_encryption` is unused: ChaCha20 keystream XOR is its own
    /// inverse, so encryption and decryption are the same operation.
    pub(super) fn new(key: &[u8], _for_encryption: bool) -> Self {
        let mut k = [0u8; KEY_BYTES];
        k.copy_from_slice(&key[..KEY_BYTES]);
        ChaCha20Cipher { key: k, nonce: [0u8; 12], counter: 0 }
    }
}

impl CipherInstance for ChaCha20Cipher {
    fn block_bytes(&self) -> usize {
        1
    }

    fn transform(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        chacha20::xor(&self.key, &self.nonce, self.counter, src, dst);
        self.counter = self.counter.wrapping_add((src.len() as u32).div_ceil(64));
        Ok(())
    }

    fn set_iv(&mut self, iv: &[u8]) -> Result<(), CipherError> {
        if iv.len() != IV_BYTES {
            return Err(CipherError::BlockSizeError);
        }
        self.nonce.copy_from_slice(&iv[..12]);
        self.counter = u32::from_be_bytes(iv[12..16].try_into().unwrap());
        Ok(())
    }

    fn get_iv(&self, out: &mut [u8]) -> Result<(), CipherError> {
        if out.len() != IV_BYTES {
            return Err(CipherError::BlockSizeError);
        }
        out[..12].copy_from_slice(&self.nonce);
        out[12..16].copy_from_slice(&self.counter.to_be_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{allocate, transform};

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let key = [0x42u8; 32];
        let mut enc = allocate("chacha20", &key, true, false).unwrap();
        let mut dec = allocate("chacha20", &key, false, false).unwrap();

        let plaintext = b"the quick brown fox jumps over the lazy dog!!!!";
        let mut ciphertext = vec![0u8; plaintext.len()];
        transform(enc.as_mut(), &mut ciphertext, plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);

        let mut decrypted = vec![0u8; plaintext.len()];
        transform(dec.as_mut(), &mut decrypted, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn set_iv_then_get_iv_round_trips() {
        let mut cipher = allocate("chacha20", &[0x11u8; 32], true, false).unwrap();
        let iv = [7u8; 16];
        cipher.set_iv(&iv).unwrap();
        let mut out = [0u8; 16];
        cipher.get_iv(&mut out).unwrap();
        assert_eq!(out, iv);
    }
}
