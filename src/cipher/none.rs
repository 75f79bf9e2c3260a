//! `"none"` registry entry: the non-cryptographic identity transform.
//!
//! Not a real cipher — `transform` copies `src` into `dst` when they are
//! distinct buffers, and is a no-op when the caller passed the same
//! buffer for both (the in-place case). Preserved because the algorithm
//! registry contract treats it like any other entry: it still has a name,
//! a block size, and a `transform` the mode dispatch can call uniformly.
//! No IV is defined, matching ECB's "no IV" contract.

use super::{CipherError, CipherInstance};

pub(super) struct NoneCipher;

impl CipherInstance for NoneCipher {
    fn block_bytes(&self) -> usize {
        1
    }

    fn transform(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
        if dst.as_ptr() == src.as_ptr() {
            return Ok(());
        }
        dst.copy_from_slice(src);
        Ok(())
    }
}
