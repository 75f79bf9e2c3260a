//! Polynomials over `GF(2^n)`: schoolbook multiply/divide, irreducibility
//! testing via `gcd(x^(q^i)+x, f)`, and random-root extraction via
//! equal-degree factorization.
//!
//! Consumed by `EC2N` curve generation over a small subfield: the
//! subfield's defining polynomial, embedded coefficient-wise into
//! `GF(2^n)`, is factored here to find the element of `GF(2^n)` that
//! plays the role of a subfield root inside the extension.

use super::{GfElement, GfModulus};
use crate::bigint::BigInt;
use crate::rng::Csprng;
use std::fmt;
use std::rc::Rc;

/// A polynomial over `GF(2^n)`, little-endian coefficient list (`coeffs[0]`
/// is the constant term). The leading coefficient is always non-zero
/// unless the polynomial is the zero polynomial (empty `coeffs`).
#[derive(Clone)]
pub struct Poly {
    coeffs: Vec<GfElement>,
    modulus: Rc<GfModulus>,
}

impl Poly {
    pub fn zero(modulus: &Rc<GfModulus>) -> Self {
        Poly { coeffs: Vec::new(), modulus: Rc::clone(modulus) }
    }

    pub fn one(modulus: &Rc<GfModulus>) -> Self {
        Poly { coeffs: vec![GfElement::one(modulus)], modulus: Rc::clone(modulus) }
    }

    /// The polynomial `x`.
    pub fn indeterminate(modulus: &Rc<GfModulus>) -> Self {
        Poly { coeffs: vec![GfElement::zero(modulus), GfElement::one(modulus)], modulus: Rc::clone(modulus) }
    }

    pub fn from_coeffs(mut coeffs: Vec<GfElement>, modulus: &Rc<GfModulus>) -> Self {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Poly { coeffs, modulus: Rc::clone(modulus) }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn degree(&self) -> isize {
        self.coeffs.len() as isize - 1
    }

    fn trim(&mut self) {
        while self.coeffs.last().is_some_and(|c| c.is_zero()) {
            self.coeffs.pop();
        }
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let zero = GfElement::zero(&self.modulus);
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.coeffs.get(i).unwrap_or(&zero);
            let b = other.coeffs.get(i).unwrap_or(&zero);
            out.push(a.add(b));
        }
        Poly::from_coeffs(out, &self.modulus)
    }

    /// Schoolbook convolution, `O(deg(a) * deg(b))` field multiplications.
    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly::zero(&self.modulus);
        }
        let mut out = vec![GfElement::zero(&self.modulus); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = out[i + j].add(&a.mul(b));
            }
        }
        Poly::from_coeffs(out, &self.modulus)
    }

    pub fn scale(&self, scalar: &GfElement) -> Poly {
        Poly::from_coeffs(self.coeffs.iter().map(|c| c.mul(scalar)).collect(), &self.modulus)
    }

    /// Schoolbook long division: `self = quotient * divisor + remainder`,
    /// `deg(remainder) < deg(divisor)`. Panics on division by the zero
    /// polynomial.
    pub fn div_rem(&self, divisor: &Poly) -> (Poly, Poly) {
        assert!(!divisor.is_zero(), "division by the zero polynomial");
        let lead_inv = divisor.coeffs.last().unwrap().invert().expect("leading coefficient of a nonzero polynomial is nonzero");
        let divisor_degree = divisor.degree();

        let mut remainder = self.clone();
        let mut quotient = vec![GfElement::zero(&self.modulus); 0];

        while !remainder.is_zero() && remainder.degree() >= divisor_degree {
            let shift = (remainder.degree() - divisor_degree) as usize;
            let factor = remainder.coeffs.last().unwrap().mul(&lead_inv);

            if quotient.len() <= shift {
                quotient.resize(shift + 1, GfElement::zero(&self.modulus));
            }
            quotient[shift] = factor.clone();

            for (i, dc) in divisor.coeffs.iter().enumerate() {
                let term = factor.mul(dc);
                remainder.coeffs[shift + i] = remainder.coeffs[shift + i].add(&term);
            }
            remainder.trim();
        }

        (Poly::from_coeffs(quotient, &self.modulus), remainder)
    }

    pub fn gcd(a: &Poly, b: &Poly) -> Poly {
        let mut x = a.clone();
        let mut y = b.clone();
        while !y.is_zero() {
            let (_, r) = x.div_rem(&y);
            x = y;
            y = r;
        }
        x.monic()
    }

    /// Normalizes to a monic polynomial (leading coefficient `1`); a no-op
    /// on the zero polynomial.
    pub fn monic(&self) -> Poly {
        if self.is_zero() {
            return self.clone();
        }
        let lead_inv = self.coeffs.last().unwrap().invert().expect("leading coefficient of a nonzero polynomial is nonzero");
        self.scale(&lead_inv)
    }

    pub fn is_one(&self) -> bool {
        self.coeffs.len() == 1 && !self.coeffs[0].is_zero() && self.coeffs[0] == GfElement::one(&self.modulus)
    }

    /// `base^exponent mod modulus`, by square-and-multiply over polynomial
    /// arithmetic (used both for the `x^(q^i)` Frobenius-style powers in
    /// the irreducibility test and for the trace-polynomial construction
    /// in root finding).
    pub fn pow_mod(base: &Poly, exponent: &BigInt, modulus: &Poly) -> Poly {
        let one = Poly::one(&base.modulus);
        if exponent.is_zero() {
            return one;
        }
        let mut result = one;
        let mut acc = base.clone();
        let (_, acc_r) = acc.div_rem(modulus);
        acc = acc_r;

        for bit in (0..exponent.bit_length()).rev() {
            result = result.mul(&result);
            let (_, r) = result.div_rem(modulus);
            result = r;
            if exponent.get_bit(bit) {
                result = result.mul(&acc);
                let (_, r) = result.div_rem(modulus);
                result = r;
            }
        }
        result
    }

    /// Tests whether `f` is irreducible over `GF(2^n)` (`n = modulus.degree()`,
    /// so the coefficient field has `q = 2^n` elements): `f` is irreducible
    /// iff `gcd(x^(q^i) + x, f) = 1` for every `i` in `1..=deg(f)/2`.
    pub fn is_irreducible(f: &Poly) -> bool {
        let degree = f.degree();
        if degree <= 0 {
            return false;
        }
        let q = BigInt::from_u64(1).shl(f.modulus.degree());
        let x = Poly::indeterminate(&f.modulus);
        let monic_f = f.monic();

        let mut q_power = q.clone();
        for _ in 1..=(degree / 2) {
            let power = Poly::pow_mod(&x, &q_power, &monic_f);
            let candidate = power.add(&x);
            if !candidate.is_zero() {
                let g = Poly::gcd(&candidate, &monic_f);
                if !g.is_one() {
                    return false;
                }
            }
            q_power = q_power.mul(&q);
        }
        true
    }

    /// Finds one root of `f` in `GF(2^n)`, assuming `f` splits completely
    /// over the field (as the subfield-embedding polynomials this is used
    /// for always do). Equal-degree-1 factorization via trace splitting:
    /// repeatedly builds the additive trace-like polynomial
    /// `h(x) = sum_{i=0}^{n-1} (t*x)^(2^i) mod f` for a random `t`, and
    /// takes `gcd(f, h)`, which (since the trace map is 2-to-1 onto
    /// `GF(2)`) splits off roughly half of `f`'s roots with each trial.
    /// Returns `None` if no root was found within a bounded number of
    /// trials (practically unreachable when `f` does split completely).
    pub fn find_root(f: &Poly, rng: &mut Csprng) -> Option<GfElement> {
        let n = f.modulus.degree();
        let mut current = f.monic();

        for _ in 0..(64 * n.max(1)) {
            if current.degree() == 1 {
                let a0 = current.coeffs[0].clone();
                let a1_inv = current.coeffs[1].invert().expect("monic linear factor has unit leading coefficient");
                return Some(a0.mul(&a1_inv).invert_additive());
            }
            if current.degree() <= 0 {
                return None;
            }

            let mut t_words = vec![0u64; f.modulus.degree() / 64 + 1];
            for w in t_words.iter_mut() {
                let mut b = [0u8; 8];
                rng.fill_bytes(&mut b);
                *w = u64::from_le_bytes(b);
            }
            let t = GfElement::from_words(t_words, &f.modulus);
            if t.is_zero() {
                continue;
            }

            let tx = Poly::indeterminate(&f.modulus).scale(&t);
            let (_, mut term) = tx.div_rem(&current);
            let mut trace = term.clone();
            for _ in 1..n {
                term = term.mul(&term);
                let (_, r) = term.div_rem(&current);
                term = r;
                trace = trace.add(&term);
            }

            let g = Poly::gcd(&trace, &current);
            if !g.is_zero() && g.degree() > 0 && g.degree() < current.degree() {
                current = g;
            }
            // else: this trial's trace didn't split `current`; retry with
            // a fresh random `t`.
        }
        None
    }
}

impl GfElement {
    /// Additive inverse: `GF(2^n)` has characteristic 2, so every element
    /// is its own additive inverse. Named explicitly for call sites (like
    /// [`Poly::find_root`]) that are solving `a1*x = a0` and want the
    /// usual `x = -a0/a1` shape to read naturally even though negation is
    /// a no-op here.
    fn invert_additive(&self) -> GfElement {
        self.clone()
    }
}

impl fmt::Debug for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Poly(deg={})", self.degree())
    }
}
