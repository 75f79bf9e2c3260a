//! Symmetric cipher registry: a name-to-descriptor table, an alias table,
//! and the `allocate`/`transform`/`free` lifecycle built on top of them.
//!
//! Concrete algorithms live in submodules ([`none`], [`chacha20`]) and are
//! wired into [`ALGORITHMS`] as [`CipherDescriptor`] entries; adding a
//! cipher means adding a submodule plus one table row, not touching the
//! lookup or allocation logic.

mod chacha20;
mod none;

use std::fmt;

/// Minimum key length used when expanding a passphrase for an algorithm
/// that does not name a longer default.
pub const MINIMAL_KEY_LENGTH: usize = 16;

/// Failure kinds surfaced by cipher lookup, allocation, and use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherError {
    /// The requested name matches neither a canonical algorithm nor an
    /// alias.
    Unsupported,
    /// The supplied key is shorter than the algorithm requires and key
    /// expansion was not requested.
    KeyTooShort,
    /// `transform` was given a buffer whose length is not a multiple of
    /// the algorithm's block size.
    BlockSizeError,
}

impl fmt::Display for CipherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CipherError::Unsupported => write!(f, "unsupported cipher name"),
            CipherError::KeyTooShort => write!(f, "key shorter than algorithm requires"),
            CipherError::BlockSizeError => write!(f, "buffer length not a multiple of block size"),
        }
    }
}

impl std::error::Error for CipherError {}

/// A running cipher, bound to a key and direction at construction time.
///
/// Implementors own their expanded key schedule / keystream state
/// exclusively; the registry never reaches into it beyond this trait.
pub trait CipherInstance {
    /// Block size in bytes this instance requires `transform` buffers to
    /// be a multiple of. Stream ciphers report `1`.
    fn block_bytes(&self) -> usize;

    /// Encrypts or decrypts `src` into `dst` (same length), per the
    /// direction fixed at construction.
    fn transform(&mut self, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError>;

    /// Sets the mode's IV, if the mode defines one.
    fn set_iv(&mut self, _iv: &[u8]) -> Result<(), CipherError> {
        Err(CipherError::Unsupported)
    }

    /// Reads back the mode's current IV, if the mode defines one.
    fn get_iv(&self, _out: &mut [u8]) -> Result<(), CipherError> {
        Err(CipherError::Unsupported)
    }
}

/// Static description of an algorithm: its wire name, sizing, and
/// constructor. `construct` receives an already-expanded (or
/// already-long-enough) key.
pub struct CipherDescriptor {
    pub name: &'static str,
    pub block_bytes: usize,
    pub default_key_bytes: usize,
    construct: fn(key: &[u8], for_encryption: bool) -> Box<dyn CipherInstance>,
}

/// Canonical algorithm table. Order is not significant; lookup is by name.
static ALGORITHMS: &[CipherDescriptor] = &[
    CipherDescriptor {
        name: "chacha20",
        block_bytes: 1,
        default_key_bytes: 32,
        construct: |key, for_encryption| Box::new(chacha20::ChaCha20Cipher::new(key, for_encryption)),
    },
    CipherDescriptor {
        name: "none",
        block_bytes: 1,
        default_key_bytes: 0,
        construct: |_key, _for_encryption| Box::new(none::NoneCipher),
    },
];

/// Short name -> canonical name. Lookup tries the canonical table first,
/// then resolves through this table into the canonical table again.
static ALIASES: &[(&str, &str)] = &[("chacha", "chacha20")];

fn find_descriptor(name: &str) -> Option<&'static CipherDescriptor> {
    ALGORITHMS.iter().find(|d| d.name == name)
}

/// Resolves `name` to its descriptor: canonical name, then alias, then
/// (in case an alias points to another alias) canonical name again.
fn lookup_descriptor(name: &str) -> Option<&'static CipherDescriptor> {
    if let Some(descriptor) = find_descriptor(name) {
        return Some(descriptor);
    }
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        return find_descriptor(canonical);
    }
    None
}

/// Returns the canonical (non-alias) name a given name resolves to.
pub fn native_name(name: &str) -> Option<&'static str> {
    lookup_descriptor(name).map(|d| d.name)
}

/// Allocates a cipher instance for `name`.
///
/// If `expand` is true, a `key` shorter than the algorithm's
/// `default_key_bytes` (or [`MINIMAL_KEY_LENGTH`] when the algorithm
/// names no minimum, i.e. is a variable-key-length stream cipher) is
/// stretched via a SHA-256-based expansion; otherwise a short key fails
/// with [`CipherError::KeyTooShort`].
pub fn allocate(name: &str, key: &[u8], for_encryption: bool, expand: bool) -> Result<Box<dyn CipherInstance>, CipherError> {
    let descriptor = lookup_descriptor(name).ok_or(CipherError::Unsupported)?;

    if key.is_empty() && !expand {
        return Err(CipherError::KeyTooShort);
    }

    let required = if descriptor.default_key_bytes == 0 { MINIMAL_KEY_LENGTH } else { descriptor.default_key_bytes };

    let owned;
    let expanded: &[u8] = if expand && key.len() < required {
        owned = expand_key(key, required);
        &owned
    } else {
        key
    };

    if expanded.len() < descriptor.default_key_bytes {
        return Err(CipherError::KeyTooShort);
    }

    tracing::debug!("cipher: allocated {} (key {} bytes, encrypt={})", descriptor.name, expanded.len(), for_encryption);
    Ok((descriptor.construct)(expanded, for_encryption))
}

/// Stretches `key` to at least `min_len` bytes by repeated SHA-256
/// hashing: `h0 = SHA256(key)`, `h1 = SHA256(h0 || key)`, ..., digests
/// concatenated until long enough, then truncated to `min_len`.
fn expand_key(key: &[u8], min_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(min_len + 32);
    let mut prev: Vec<u8> = Vec::new();
    while out.len() < min_len {
        let mut input = prev.clone();
        input.extend_from_slice(key);
        let digest = crate::hash::sha256(&input).to_be_bytes();
        out.extend_from_slice(&digest);
        prev = digest.to_vec();
    }
    out.truncate(min_len);
    out
}

/// Runs `transform`, rejecting buffers whose length is not a multiple of
/// `instance.block_bytes()` up front (mirrors the length check a caller
/// would otherwise have to repeat before every `transform` call).
pub fn transform(instance: &mut dyn CipherInstance, dst: &mut [u8], src: &[u8]) -> Result<(), CipherError> {
    let block = instance.block_bytes();
    if src.len() % block != 0 {
        return Err(CipherError::BlockSizeError);
    }
    instance.transform(dst, src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_unsupported() {
        assert_eq!(allocate("not-a-cipher", &[0u8; 32], true, false).unwrap_err(), CipherError::Unsupported);
    }

    #[test]
    fn short_key_without_expand_is_rejected() {
        assert_eq!(allocate("chacha20", &[0u8; 4], true, false).unwrap_err(), CipherError::KeyTooShort);
    }

    #[test]
    fn short_key_with_expand_succeeds() {
        let mut cipher = allocate("chacha20", b"short passphrase", true, true).unwrap();
        let src = [0u8; 16];
        let mut dst = [0u8; 16];
        assert!(transform(cipher.as_mut(), &mut dst, &src).is_ok());
    }

    #[test]
    fn alias_resolves_to_canonical() {
        assert_eq!(native_name("chacha"), Some("chacha20"));
    }

    #[test]
    fn none_cipher_copies_bytes() {
        let mut cipher = allocate("none", &[], true, false).unwrap();
        let src = b"hello world12345";
        let mut dst = [0u8; 16];
        transform(cipher.as_mut(), &mut dst, src).unwrap();
        assert_eq!(&dst, src);
    }
}
