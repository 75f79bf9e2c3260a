//! Arbitrary-precision signed integers.
//!
//! This is the arithmetic engine the rest of the crate is built on: the
//! discrete-log layer ([`crate::dlpk`]) and both elliptic-curve layers
//! ([`crate::ecp`], [`crate::ec2n`]) reduce to `BigInt` operations.
//!
//! The representation generalizes a fixed-width big-endian byte array
//! (`U256`'s big-endian byte array, `primitives::ops`'s carry-propagating
//! loops) but drops the fixed width: magnitude is a little-endian `Vec<u64>`
//! of words with an implicit "used length" enforced by normalization after
//! every mutating operation, plus a separate sign bit. Zero is always
//! non-negative (`words` empty and `negative == false`).

mod div;
mod montgomery;
mod mul;
mod primality;
mod sqrt;

pub use montgomery::MontgomeryContext;
pub use primality::is_probable_prime;

use std::cmp::Ordering;
use std::fmt;

/// Below this many words, `mul`/`square` use schoolbook multiplication.
pub(crate) const KARATSUBA_MUL_THRESHOLD: usize = 28;

/// Below this many words, `square` uses the schoolbook diagonal-expansion
/// algorithm rather than Karatsuba squaring.
pub(crate) const KARATSUBA_SQR_THRESHOLD: usize = 60;

/// Failure kinds produced by the arithmetic engine.
///
/// Matches the `Fatal` / `ArithmeticFailure` split from the error-handling
/// design: division by zero and even-modulus Montgomery setup are
/// programming bugs (the caller should treat them as unrecoverable),
/// while inversion of a non-unit and a non-residue square root are
/// ordinary, expected failure modes reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BigIntError {
    /// Division, modulus, or inversion was attempted with a zero divisor.
    DivisionByZero,
    /// Montgomery context construction was attempted with an even modulus.
    EvenModulus,
    /// `invert` was called on a value with no inverse modulo `m`.
    NotInvertible,
    /// `mod_sqrt` was called on a non-residue, or with a non-prime modulus
    /// the algorithm cannot handle.
    NotAResidue,
    /// A negative exponent was passed to `powm`.
    NegativeExponent,
}

impl fmt::Display for BigIntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BigIntError::DivisionByZero => write!(f, "division by zero"),
            BigIntError::EvenModulus => write!(f, "montgomery modulus must be odd"),
            BigIntError::NotInvertible => write!(f, "value has no inverse modulo m"),
            BigIntError::NotAResidue => write!(f, "value is not a quadratic residue"),
            BigIntError::NegativeExponent => write!(f, "exponent must be non-negative"),
        }
    }
}

impl std::error::Error for BigIntError {}

/// An arbitrary-precision signed integer.
///
/// Invariant: `words` never has a non-zero length with a zero top word
/// (trailing zero words are truncated by [`BigInt::normalize`]), and
/// `negative` is `false` whenever `words` is empty.
#[derive(Clone, Debug, Default, Eq)]
pub struct BigInt {
    negative: bool,
    words: Vec<u64>,
}

impl BigInt {
    /// The value zero.
    pub fn zero() -> Self {
        BigInt { negative: false, words: Vec::new() }
    }

    /// Constructs a `BigInt` directly from little-endian words and a sign.
    fn from_parts(negative: bool, mut words: Vec<u64>) -> Self {
        while words.last() == Some(&0) {
            words.pop();
        }
        let negative = negative && !words.is_empty();
        BigInt { negative, words }
    }

    pub fn from_u64(value: u64) -> Self {
        if value == 0 {
            BigInt::zero()
        } else {
            BigInt { negative: false, words: vec![value] }
        }
    }

    pub fn from_i64(value: i64) -> Self {
        if value >= 0 {
            BigInt::from_u64(value as u64)
        } else {
            let mut b = BigInt::from_u64(value.unsigned_abs());
            b.negative = true;
            b
        }
    }

    pub fn is_zero(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn sign(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.negative {
            -1
        } else {
            1
        }
    }

    /// Words in little-endian order (no leading/trailing zero word).
    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn abs(&self) -> Self {
        BigInt { negative: false, words: self.words.clone() }
    }

    pub fn neg(&self) -> Self {
        BigInt::from_parts(!self.negative, self.words.clone())
    }

    /// Number of significant bits (0 for zero).
    pub fn bit_length(&self) -> usize {
        match self.words.last() {
            None => 0,
            Some(&top) => (self.words.len() - 1) * 64 + (64 - top.leading_zeros() as usize),
        }
    }

    pub fn get_bit(&self, index: usize) -> bool {
        let word_index = index / 64;
        if word_index >= self.words.len() {
            return false;
        }
        (self.words[word_index] >> (index % 64)) & 1 == 1
    }

    /// Constructs a non-negative `BigInt` from a big-endian byte slice.
    pub fn from_bytes_be(bytes: &[u8]) -> Self {
        let mut words = Vec::with_capacity(bytes.len() / 8 + 1);
        let mut chunk = [0u8; 8];
        let mut iter = bytes.rchunks(8);
        while let Some(c) = iter.next() {
            chunk = [0u8; 8];
            chunk[8 - c.len()..].copy_from_slice(c);
            words.push(u64::from_be_bytes(chunk));
        }
        BigInt::from_parts(false, words)
    }

    /// Encodes the magnitude as big-endian bytes, left-padded with zeros to
    /// exactly `len` bytes. Panics if the value does not fit.
    pub fn to_bytes_be_padded(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (i, word) in self.words.iter().enumerate() {
            let word_bytes = word.to_be_bytes();
            let start = len as isize - (i as isize + 1) * 8;
            for (j, b) in word_bytes.iter().enumerate() {
                let pos = start + j as isize;
                if pos < 0 {
                    assert_eq!(*b, 0, "value does not fit in {len} bytes");
                    continue;
                }
                out[pos as usize] = *b;
            }
        }
        out
    }

    /// Minimal-length big-endian byte encoding of the magnitude (empty for
    /// zero).
    pub fn to_bytes_be(&self) -> Vec<u8> {
        let len = (self.bit_length() + 7) / 8;
        self.to_bytes_be_padded(len)
    }

    /// Number of bytes needed to represent the magnitude (`byte_size` from
    /// used for fixed-width signature/DH encodings.
    pub fn byte_size(&self) -> usize {
        (self.bit_length() + 7) / 8
    }

    /// Parses a base-16 literal, optionally prefixed with `0x`/`0X`, into a
    /// non-negative `BigInt`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if s.is_empty() {
            return Some(BigInt::zero());
        }
        let mut bytes = Vec::with_capacity((s.len() + 1) / 2);
        let digits: Vec<u8> = s.bytes().map(|c| (c as char).to_digit(16)).collect::<Option<Vec<u32>>>()?
            .into_iter()
            .map(|d| d as u8)
            .collect();
        let padded_len = if digits.len() % 2 == 0 { digits.len() } else { digits.len() + 1 };
        let mut padded = vec![0u8; padded_len - digits.len()];
        padded.extend(digits);
        for pair in padded.chunks_exact(2) {
            bytes.push((pair[0] << 4) | pair[1]);
        }
        Some(BigInt::from_bytes_be(&bytes))
    }

    /// Parses a base-10 decimal literal (optionally `-`-prefixed).
    pub fn from_decimal(s: &str) -> Option<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut acc = BigInt::zero();
        let ten = BigInt::from_u64(10);
        for c in digits.bytes() {
            acc = acc.checked_mul_unsigned(&ten).add(&BigInt::from_u64((c - b'0') as u64));
        }
        acc.negative = negative && !acc.is_zero();
        Some(acc)
    }

    fn checked_mul_unsigned(&self, other: &BigInt) -> BigInt {
        let mut r = self.mul(other);
        r.negative = false;
        r
    }

    /// Renders the value in the given base (2, 10, or 16).
    pub fn to_string_radix(&self, base: u32) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut digits = Vec::new();
        let mut cur = self.abs();
        let base_big = BigInt::from_u64(base as u64);
        while !cur.is_zero() {
            let (q, r) = cur.div_rem(&base_big).expect("nonzero base");
            let d = r.words.first().copied().unwrap_or(0) as u32;
            digits.push(std::char::from_digit(d, base).unwrap());
            cur = q;
        }
        if self.negative {
            digits.push('-');
        }
        digits.iter().rev().collect()
    }

    fn cmp_magnitude(&self, other: &BigInt) -> Ordering {
        if self.words.len() != other.words.len() {
            return self.words.len().cmp(&other.words.len());
        }
        for (a, b) in self.words.iter().rev().zip(other.words.iter().rev()) {
            if a != b {
                return a.cmp(b);
            }
        }
        Ordering::Equal
    }

    fn add_magnitude(a: &[u64], b: &[u64]) -> Vec<u64> {
        let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u128;
        for i in 0..long.len() {
            let bw = *short.get(i).unwrap_or(&0) as u128;
            let sum = long[i] as u128 + bw + carry;
            out.push(sum as u64);
            carry = sum >> 64;
        }
        if carry != 0 {
            out.push(carry as u64);
        }
        out
    }

    /// Subtracts `b` from `a`, assuming `a >= b` in magnitude.
    fn sub_magnitude(a: &[u64], b: &[u64]) -> Vec<u64> {
        let mut out = Vec::with_capacity(a.len());
        let mut borrow = 0i128;
        for i in 0..a.len() {
            let bw = *b.get(i).unwrap_or(&0) as i128;
            let mut diff = a[i] as i128 - bw - borrow;
            if diff < 0 {
                diff += 1i128 << 64;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out.push(diff as u64);
        }
        out
    }

    pub fn add(&self, other: &BigInt) -> BigInt {
        if self.negative == other.negative {
            BigInt::from_parts(self.negative, BigInt::add_magnitude(&self.words, &other.words))
        } else {
            match self.cmp_magnitude(other) {
                Ordering::Equal => BigInt::zero(),
                Ordering::Greater => {
                    BigInt::from_parts(self.negative, BigInt::sub_magnitude(&self.words, &other.words))
                }
                Ordering::Less => {
                    BigInt::from_parts(other.negative, BigInt::sub_magnitude(&other.words, &self.words))
                }
            }
        }
    }

    pub fn sub(&self, other: &BigInt) -> BigInt {
        self.add(&other.neg())
    }

    /// Shifts left by `bits` positions (multiplies by `2^bits`).
    pub fn shl(&self, bits: usize) -> BigInt {
        if self.is_zero() || bits == 0 {
            return self.clone();
        }
        let word_shift = bits / 64;
        let bit_shift = bits % 64;
        let mut out = vec![0u64; word_shift];
        let mut carry = 0u64;
        for &w in &self.words {
            let shifted = if bit_shift == 0 { w } else { (w << bit_shift) | carry };
            carry = if bit_shift == 0 { 0 } else { w >> (64 - bit_shift) };
            out.push(shifted);
        }
        if carry != 0 {
            out.push(carry);
        }
        BigInt::from_parts(self.negative, out)
    }

    /// Shifts right by `bits` positions (floor division by `2^bits`, on the
    /// magnitude — callers needing floor-toward-negative-infinity on
    /// negative values should use [`BigInt::div_rem`] instead).
    pub fn shr(&self, bits: usize) -> BigInt {
        let word_shift = bits / 64;
        let bit_shift = bits % 64;
        if word_shift >= self.words.len() {
            return BigInt::zero();
        }
        let src = &self.words[word_shift..];
        let mut out = vec![0u64; src.len()];
        for i in 0..src.len() {
            let lo = src[i] >> bit_shift;
            let hi = if bit_shift == 0 || i + 1 >= src.len() {
                0
            } else {
                src[i + 1] << (64 - bit_shift)
            };
            out[i] = lo | hi;
        }
        BigInt::from_parts(self.negative, out)
    }

    pub fn mul(&self, other: &BigInt) -> BigInt {
        let negative = self.negative != other.negative;
        let mag = mul::mul_magnitude(&self.words, &other.words);
        BigInt::from_parts(negative, mag)
    }

    pub fn square(&self) -> BigInt {
        BigInt::from_parts(false, mul::square_magnitude(&self.words))
    }

    /// Truncating division and remainder: `self = q * other + r` with
    /// `|r| < |other|` and `r` taking the sign of `self` (standard
    /// "truncated toward zero" division): `div_rem` is the raw truncating
    /// operation, [`Self::rem_euclid`] is the non-negative-representative
    /// form the elliptic-curve code relies on.
    pub fn div_rem(&self, other: &BigInt) -> Result<(BigInt, BigInt), BigIntError> {
        if other.is_zero() {
            return Err(BigIntError::DivisionByZero);
        }
        let (q_mag, r_mag) = div::div_rem_magnitude(&self.words, &other.words);
        let q = BigInt::from_parts(self.negative != other.negative, q_mag);
        let r = BigInt::from_parts(self.negative, r_mag);
        Ok((q, r))
    }

    /// Non-negative modulus representative in `[0, |other|)`, matching the
    /// elliptic-curve code's expectation.
    pub fn rem_euclid(&self, other: &BigInt) -> Result<BigInt, BigIntError> {
        let (_, r) = self.div_rem(other)?;
        if r.negative {
            Ok(r.add(&other.abs()))
        } else {
            Ok(r)
        }
    }

    pub fn gcd(&self, other: &BigInt) -> BigInt {
        div::gcd(&self.abs(), &other.abs())
    }

    /// Extended Euclid: returns `(g, x, y)` with `g = gcd(a, b) = a*x + b*y`.
    pub fn gcdext(&self, other: &BigInt) -> (BigInt, BigInt, BigInt) {
        div::gcdext(self, other)
    }

    /// Modular inverse of `self` modulo `m`, always returned in `[0, m)`.
    pub fn invert(&self, m: &BigInt) -> Result<BigInt, BigIntError> {
        let (g, x, _) = self.gcdext(m);
        if g != BigInt::from_u64(1) && g != BigInt::from_i64(-1) {
            return Err(BigIntError::NotInvertible);
        }
        x.rem_euclid(m)
    }

    /// `self^exponent mod modulus`, dispatching to Montgomery
    /// exponentiation for odd moduli and naive binary powering otherwise.
    pub fn powm(&self, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt, BigIntError> {
        montgomery::powm(self, exponent, modulus)
    }

    pub fn sqrt(&self) -> BigInt {
        sqrt::isqrt(self)
    }

    pub fn is_perfect_square(&self) -> bool {
        sqrt::is_perfect_square(self)
    }

    pub fn mod_sqrt(&self, p: &BigInt) -> Result<BigInt, BigIntError> {
        sqrt::mod_sqrt(self, p)
    }

    pub fn kronecker(&self, other: &BigInt) -> i32 {
        sqrt::kronecker(self, other)
    }

    pub fn is_probable_prime(&self, rounds: u32) -> bool {
        primality::is_probable_prime(self, rounds)
    }

    pub fn next_prime(&self) -> BigInt {
        primality::next_prime(self)
    }
}

impl PartialEq for BigInt {
    fn eq(&self, other: &Self) -> bool {
        self.negative == other.negative && self.words == other.words
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_radix(10))
    }
}
