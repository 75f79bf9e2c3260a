//! Discrete-log public-key layer: shared, reference-counted parameter
//! sets, a per-parameter randomizer stack, DSA sign/verify, and
//! Diffie-Hellman generate/final.
//!
//! Every component here composes [`crate::bigint::BigInt`] for its
//! arithmetic; nothing in this module touches words or limbs directly.

mod dh;
mod dsa;
mod serialize;

pub use dh::{dh_final, dh_final_unified, dh_generate, DhHandle};
pub use dsa::{dsa_sign, dsa_verify};
pub use serialize::{
    decode_params, decode_private_key, decode_public_key, decode_randomizer, encode_params,
    encode_private_key, encode_public_key, encode_randomizer,
};

use crate::bigint::BigInt;
use crate::rng::Csprng;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Failure kinds for the discrete-log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlError {
    /// A signature's `r` or `s` component was out of range, or
    /// verification's recomputed `v` did not match `r`.
    InvalidSignature,
    /// Serialised parameters, a key, or a randomizer were malformed.
    DecodeError,
    /// A modular inverse needed during signing or verification does not
    /// exist (practically unreachable for correctly generated parameters,
    /// but checked rather than assumed).
    ArithmeticFailure,
}

impl fmt::Display for DlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DlError::InvalidSignature => write!(f, "signature failed verification"),
            DlError::DecodeError => write!(f, "malformed serialised discrete-log data"),
            DlError::ArithmeticFailure => write!(f, "required modular inverse does not exist"),
        }
    }
}

impl std::error::Error for DlError {}

/// A precomputed `(k, g^k mod p)` pair, consumed in LIFO order by signing
/// and DH so the caller can amortise the exponentiation across idle time.
#[derive(Clone, Debug)]
pub struct Randomizer {
    pub k: BigInt,
    pub gk: BigInt,
}

/// `(p, g, q)` with `p, q` prime and `g` a generator of the order-`q`
/// subgroup of `(Z/pZ)*`, shared by every key built from it via [`Rc`].
///
/// The randomizer stack lives on the parameter object (not on individual
/// keys) precisely because every key sharing a parameter set shares the
/// stack: cloning a key shares the handle, not a copy of the stack.
pub struct DlParams {
    pub p: BigInt,
    pub g: BigInt,
    pub q: BigInt,
    pub name: Option<&'static str>,
    pub exponent_entropy: Option<usize>,
    randomizers: RefCell<Vec<Randomizer>>,
}

impl DlParams {
    fn matches(&self, p: &BigInt, g: &BigInt, q: &BigInt, exponent_entropy: Option<usize>) -> bool {
        &self.p == p && &self.g == g && &self.q == q && self.exponent_entropy == exponent_entropy
    }

    /// Pushes a precomputed randomizer, e.g. one imported from another
    /// process or generated offline ahead of time.
    pub fn push_randomizer(&self, r: Randomizer) {
        self.randomizers.borrow_mut().push(r);
    }

    /// Pops the most recently pushed randomizer, if any.
    pub fn pop_randomizer(&self) -> Option<Randomizer> {
        self.randomizers.borrow_mut().pop()
    }

    /// Draws a fresh `(k, g^k mod p)` pair directly, bypassing the stack.
    /// `k` is uniform in `[1, q)`, optionally truncated to
    /// `exponent_entropy` bytes of entropy before reduction.
    pub fn fresh_randomizer(&self, rng: &mut Csprng) -> Randomizer {
        let k = uniform_mod_bounded_entropy(&self.q, rng, self.exponent_entropy);
        let gk = self.g.powm(&k, &self.p).expect("p is a fixed positive modulus");
        Randomizer { k, gk }
    }

    /// Pops a randomizer if the stack is non-empty, otherwise draws a
    /// fresh one; this is the path signing and DH actually use.
    pub fn take_randomizer(&self, rng: &mut Csprng) -> Randomizer {
        match self.pop_randomizer() {
            Some(r) => {
                tracing::trace!("dlpk: consumed precomputed randomizer, stack depth now {}", self.randomizers.borrow().len());
                r
            }
            None => {
                tracing::trace!("dlpk: randomizer stack empty, generating fresh pair");
                self.fresh_randomizer(rng)
            }
        }
    }
}

impl fmt::Debug for DlParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DlParams")
            .field("p_bits", &self.p.bit_length())
            .field("q_bits", &self.q.bit_length())
            .field("name", &self.name)
            .finish()
    }
}

thread_local! {
    /// Process-wide (here: thread-local, since the whole crate assumes a
    /// single-threaded cooperative caller) interning registry. Entries are
    /// `Weak` so a parameter set with no remaining strong references is
    /// dropped without this registry keeping it alive.
    static REGISTRY: RefCell<Vec<Weak<DlParams>>> = RefCell::new(Vec::new());
}

/// Interns `(p, g, q, exponent_entropy)`: if a matching, still-alive
/// parameter set already exists, returns a new strong handle to it
/// (bumping its reference count); otherwise builds, registers, and
/// returns a fresh one.
pub fn intern_params(p: BigInt, g: BigInt, q: BigInt, name: Option<&'static str>, exponent_entropy: Option<usize>) -> Rc<DlParams> {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        registry.retain(|weak| weak.strong_count() > 0);

        for weak in registry.iter() {
            if let Some(existing) = weak.upgrade() {
                if existing.matches(&p, &g, &q, exponent_entropy) {
                    tracing::debug!("dlpk: parameter intern hit ({} bit p)", existing.p.bit_length());
                    return existing;
                }
            }
        }

        tracing::debug!("dlpk: parameter intern miss, registering new entry ({} bit p)", p.bit_length());
        let params = Rc::new(DlParams { p, g, q, name, exponent_entropy, randomizers: RefCell::new(Vec::new()) });
        registry.push(Rc::downgrade(&params));
        params
    })
}

/// Number of live (strong-counted) parameter sets in the interning
/// registry; exposed for tests that want to observe interning behaviour.
pub fn registry_len() -> usize {
    REGISTRY.with(|registry| registry.borrow().iter().filter(|w| w.strong_count() > 0).count())
}

/// A public key: `(params, y = g^x mod p)`.
#[derive(Clone, Debug)]
pub struct PublicKey {
    pub params: Rc<DlParams>,
    pub y: BigInt,
}

/// A private key: `(params, x, y)`.
#[derive(Clone, Debug)]
pub struct PrivateKey {
    pub params: Rc<DlParams>,
    pub x: BigInt,
    pub y: BigInt,
}

impl PrivateKey {
    /// Generates a fresh keypair for `params`: `x` uniform in `[1, q)`,
    /// `y = g^x mod p`.
    pub fn generate(params: Rc<DlParams>, rng: &mut Csprng) -> Self {
        let x = uniform_mod_bounded_entropy(&params.q, rng, params.exponent_entropy);
        let y = params.g.powm(&x, &params.p).expect("p is a fixed positive modulus");
        PrivateKey { params, x, y }
    }

    pub fn public(&self) -> PublicKey {
        PublicKey { params: Rc::clone(&self.params), y: self.y.clone() }
    }
}

/// Uniform integer in `[0, q)` drawn from `rng` via rejection sampling on
/// the byte width of `q`. This is the crate's only source of *strong*
/// randomness for exponents; `BigInt`'s internal helpers are explicitly
/// unsuitable for this (see [`crate::bigint`]).
pub fn uniform_mod(q: &BigInt, rng: &mut Csprng) -> BigInt {
    uniform_mod_bounded_entropy(q, rng, None)
}

/// As [`uniform_mod`], but the candidate is drawn from at most
/// `entropy_bytes` bytes of randomness before reduction mod `q` (used to
/// cap the exponent's entropy below `q`'s own bit length, when callers
/// want a smaller private-key search space).
pub fn uniform_mod_bounded_entropy(q: &BigInt, rng: &mut Csprng, entropy_bytes: Option<usize>) -> BigInt {
    let byte_len = entropy_bytes.unwrap_or_else(|| q.byte_size() + 8);
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let candidate = BigInt::from_bytes_be(&buf).rem_euclid(q).expect("q is a fixed positive modulus");
        if !candidate.is_zero() {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_params() -> Rc<DlParams> {
        // Small illustrative (p, q, g): p=23, q=11, g generates the
        // order-11 subgroup of (Z/23Z)*.
        intern_params(BigInt::from_u64(23), BigInt::from_u64(4), BigInt::from_u64(11), None, None)
    }

    #[test]
    fn interning_shares_identical_parameters() {
        let a = toy_params();
        let b = intern_params(BigInt::from_u64(23), BigInt::from_u64(4), BigInt::from_u64(11), None, None);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_parameters_do_not_share() {
        let a = toy_params();
        let b = intern_params(BigInt::from_u64(23), BigInt::from_u64(2), BigInt::from_u64(11), None, None);
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn randomizer_stack_is_lifo() {
        let params = intern_params(BigInt::from_u64(23), BigInt::from_u64(4), BigInt::from_u64(11), None, None);
        params.push_randomizer(Randomizer { k: BigInt::from_u64(1), gk: BigInt::from_u64(4) });
        params.push_randomizer(Randomizer { k: BigInt::from_u64(2), gk: BigInt::from_u64(16) });
        assert_eq!(params.pop_randomizer().unwrap().k, BigInt::from_u64(2));
        assert_eq!(params.pop_randomizer().unwrap().k, BigInt::from_u64(1));
        assert!(params.pop_randomizer().is_none());
    }
}
