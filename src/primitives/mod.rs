//! Small fixed-size integer primitives shared by the hashing and keystream
//! modules.
//!
//! This is deliberately not the arbitrary-precision engine: `U256` is a
//! 32-byte value type used to carry hash digests and 256-bit key material
//! between modules. The arbitrary-precision signed integer used by the
//! discrete-log and elliptic-curve layers lives in [`crate::bigint`].

use std::fmt::{Display, Formatter, Result};

/// 256-bit value stored as 32 big-endian bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct U256(pub(crate) [u8; 32]);

impl U256 {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Returns the big-endian byte representation.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl From<[u8; 32]> for U256 {
    fn from(bytes: [u8; 32]) -> Self {
        U256(bytes)
    }
}

impl From<[u32; 8]> for U256 {
    /// Packs eight big-endian 32-bit words (a SHA-256 state) into a digest.
    fn from(words: [u32; 8]) -> Self {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        U256(out)
    }
}

impl Display for U256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for byte in self.0.iter() {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
