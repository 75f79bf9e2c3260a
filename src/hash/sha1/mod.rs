//! SHA-1 (FIPS 180-4, retained for legacy digest compatibility).
//!
//! The discrete-log signing layer (see [`crate::dlpk`]) is hash-agnostic:
//! it consumes any digest whose length matches what the caller expects.
//! SHA-1 is kept here because the reference parameter sets this crate is
//! tested against (see `tests/dlpk.rs`) were historically specified with
//! SHA-1 message digests.

pub mod core;

/// Initial hash value H(0).
pub(crate) const H160_INIT: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];
