//! `GF(2^n)` binary-field arithmetic: a sparse irreducible modulus, field
//! elements reduced against it, and the unreduced binary polynomials used
//! for modulus search and irreducibility testing.
//!
//! Elements are little-endian `u64` bit-vectors. Multiplication is
//! carryless (XOR in place of addition); reduction walks the modulus's
//! sparse term list instead of a generic long division.

mod bpoly;
mod ops;
pub mod poly;

pub use bpoly::{search_irreducible, BPoly};

use std::fmt;
use std::rc::Rc;

/// Failure kinds for `GF(2^n)` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GfError {
    /// `invert` was called on the additive identity.
    NotInvertible,
    /// The candidate modulus polynomial is not irreducible over `GF(2)`.
    NotIrreducible,
}

impl fmt::Display for GfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GfError::NotInvertible => write!(f, "zero has no multiplicative inverse"),
            GfError::NotIrreducible => write!(f, "modulus polynomial is not irreducible"),
        }
    }
}

impl std::error::Error for GfError {}

/// An irreducible polynomial over `GF(2)` of degree `n`, stored as the
/// sorted set of bit positions where a coefficient is set (always
/// including `0` and `degree`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfModulus {
    degree: usize,
    /// Strictly increasing exponents with a nonzero coefficient, including
    /// both `0` and `degree`.
    terms: Vec<usize>,
    words: usize,
}

impl GfModulus {
    /// Builds a modulus from its nonzero-term exponents (e.g. `[0, 9, 113]`
    /// for `x^113 + x^9 + 1`). Fails if the polynomial is reducible.
    pub fn new(mut terms: Vec<usize>) -> Result<Self, GfError> {
        terms.sort_unstable();
        terms.dedup();
        let degree = *terms.last().expect("modulus must have at least one term");
        if !bpoly::is_irreducible(&terms, degree) {
            return Err(GfError::NotIrreducible);
        }
        let words = degree / 64 + 1;
        Ok(GfModulus { degree, terms, words })
    }

    /// Builds a modulus without checking irreducibility; for moduli already
    /// known-good (fixed curve parameters, test vectors).
    pub fn new_unchecked(mut terms: Vec<usize>) -> Self {
        terms.sort_unstable();
        terms.dedup();
        let degree = *terms.last().expect("modulus must have at least one term");
        let words = degree / 64 + 1;
        GfModulus { degree, terms, words }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn terms(&self) -> &[usize] {
        &self.terms
    }
}

/// An element of `GF(2^n)` for a particular modulus, shared by `Rc` so
/// elements of the same field can be passed around cheaply without
/// threading the modulus through every call explicitly.
#[derive(Clone)]
pub struct GfElement {
    words: Vec<u64>,
    modulus: Rc<GfModulus>,
}

impl GfElement {
    pub fn zero(modulus: &Rc<GfModulus>) -> Self {
        GfElement { words: vec![0u64; modulus.words], modulus: Rc::clone(modulus) }
    }

    pub fn one(modulus: &Rc<GfModulus>) -> Self {
        let mut e = GfElement::zero(modulus);
        e.words[0] = 1;
        e
    }

    /// Builds an element from a little-endian bit-vector, reducing it
    /// modulo the field's modulus first if it is wider than `degree` bits.
    pub fn from_words(words: Vec<u64>, modulus: &Rc<GfModulus>) -> Self {
        let mut e = GfElement { words, modulus: Rc::clone(modulus) };
        ops::reduce(&mut e.words, &e.modulus);
        e.words.resize(e.modulus.words, 0);
        e
    }

    pub fn from_bytes_be(bytes: &[u8], modulus: &Rc<GfModulus>) -> Self {
        let mut words = vec![0u64; (bytes.len() + 7) / 8];
        for (i, chunk) in bytes.rchunks(8).enumerate() {
            let mut buf = [0u8; 8];
            buf[8 - chunk.len()..].copy_from_slice(chunk);
            words[i] = u64::from_be_bytes(buf);
        }
        GfElement::from_words(words, modulus)
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn modulus(&self) -> &Rc<GfModulus> {
        &self.modulus
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn add(&self, other: &GfElement) -> GfElement {
        debug_assert!(Rc::ptr_eq(&self.modulus, &other.modulus));
        let mut out = vec![0u64; self.modulus.words];
        for i in 0..out.len() {
            out[i] = self.words[i] ^ other.words[i];
        }
        GfElement { words: out, modulus: Rc::clone(&self.modulus) }
    }

    pub fn mul(&self, other: &GfElement) -> GfElement {
        debug_assert!(Rc::ptr_eq(&self.modulus, &other.modulus));
        let mut product = ops::mul_carryless(&self.words, &other.words);
        ops::reduce(&mut product, &self.modulus);
        product.resize(self.modulus.words, 0);
        GfElement { words: product, modulus: Rc::clone(&self.modulus) }
    }

    /// Squaring by bit-interleaving: strictly faster than `mul(self, self)`
    /// because no cross terms are produced.
    pub fn square(&self) -> GfElement {
        let mut squared = ops::square_bitinterleave(&self.words);
        ops::reduce(&mut squared, &self.modulus);
        squared.resize(self.modulus.words, 0);
        GfElement { words: squared, modulus: Rc::clone(&self.modulus) }
    }

    /// Multiplicative inverse via the almost-inverse algorithm.
    pub fn invert(&self) -> Result<GfElement, GfError> {
        if self.is_zero() {
            return Err(GfError::NotInvertible);
        }
        Ok(ops::almost_inverse(self))
    }

    /// Absolute trace `Tr(a) = a + a^2 + a^4 + ... + a^(2^(n-1))`, a single
    /// bit in `GF(2)` represented as `bool`.
    pub fn trace(&self) -> bool {
        let mut acc = self.clone();
        let mut sum = self.clone();
        for _ in 1..self.modulus.degree {
            acc = acc.square();
            sum = sum.add(&acc);
        }
        !sum.is_zero()
    }
}

impl PartialEq for GfElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.modulus, &other.modulus) && self.words == other.words
    }
}
impl Eq for GfElement {}

impl fmt::Debug for GfElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GfElement(")?;
        for w in self.words.iter().rev() {
            write!(f, "{:016x}", w)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modulus_113() -> Rc<GfModulus> {
        // x^113 + x^9 + 1, the curve modulus used by the fixed EC2N test vector.
        Rc::new(GfModulus::new_unchecked(vec![0, 9, 113]))
    }

    #[test]
    fn add_is_involution() {
        let m = modulus_113();
        let a = GfElement::from_words(vec![0x1234_5678, 0xabcd], &m);
        let b = GfElement::from_words(vec![0x9999, 0], &m);
        assert_eq!(a.add(&b).add(&b), a);
    }

    #[test]
    fn mul_identity() {
        let m = modulus_113();
        let a = GfElement::from_words(vec![0x1234_5678, 0xabcd], &m);
        let one = GfElement::one(&m);
        assert_eq!(a.mul(&one), a);
    }

    #[test]
    fn invert_round_trip() {
        let m = modulus_113();
        let a = GfElement::from_words(vec![0x1234_5678, 0xabcd], &m);
        let inv = a.invert().unwrap();
        assert_eq!(a.mul(&inv), GfElement::one(&m));
    }

    #[test]
    fn squaring_is_linear() {
        let m = modulus_113();
        let a = GfElement::from_words(vec![0x1234_5678, 0xabcd], &m);
        let b = GfElement::from_words(vec![0x9999, 0x1], &m);
        let lhs = a.add(&b).square();
        let rhs = a.square().add(&b.square());
        assert_eq!(lhs, rhs);
    }
}
