//! Elliptic curves `y^2 + xy = x^3 + ax^2 + b` over `GF(2^n)`.
//!
//! Affine coordinates only: unlike the prime-field curve in [`crate::ecp`],
//! inversion in `GF(2^n)` is comparatively cheap (the almost-inverse
//! algorithm), so there is no projective fast path here. Curves defined
//! over a small subfield `GF(2^q)` carry a Frobenius descriptor that lets
//! scalar multiplication trade doublings for the (cheap) Frobenius
//! endomorphism via a tau-adic NAF expansion.

use crate::bigint::BigInt;
use crate::gf2n::{GfElement, GfModulus};
use std::fmt;
use std::rc::Rc;

/// Failure kinds for binary-curve operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ec2nError {
    /// The point does not satisfy the curve equation.
    NotOnCurve,
}

impl fmt::Display for Ec2nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ec2nError::NotOnCurve => write!(f, "point does not satisfy the curve equation"),
        }
    }
}

impl std::error::Error for Ec2nError {}

/// Frobenius descriptor for a curve defined over a small subfield
/// `GF(2^q)`: `phi(x,y) = (x^(2^q), y^(2^q))` is then an endomorphism
/// satisfying `tau^2 - c*tau + 2^q = 0`, letting scalar multiplication
/// replace most doublings with repeated Frobenius application.
#[derive(Clone, Copy, Debug)]
pub struct FrobeniusParams {
    /// `q`: the subfield is `GF(2^q)`.
    pub q: u32,
    /// `c` in `tau^2 - c*tau + 2^q = 0` (the curve's trace parameter).
    pub c: i64,
}

/// `y^2 + xy = x^3 + ax^2 + b` over `GF(2^n)`.
#[derive(Clone)]
pub struct Curve2N {
    pub modulus: Rc<GfModulus>,
    pub a: GfElement,
    pub b: GfElement,
    /// Present only when the curve is defined over a small subfield.
    pub frobenius: Option<FrobeniusParams>,
}

/// An affine point, with an explicit point-at-infinity flag (there is no
/// analogue of Jacobian "Z=0" here since we never leave affine form).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffinePoint2N {
    pub x: GfElement,
    pub y: GfElement,
    pub infinity: bool,
}

impl AffinePoint2N {
    pub fn infinity(modulus: &Rc<GfModulus>) -> Self {
        AffinePoint2N { x: GfElement::zero(modulus), y: GfElement::zero(modulus), infinity: true }
    }

    pub fn new(x: GfElement, y: GfElement) -> Self {
        AffinePoint2N { x, y, infinity: false }
    }
}

impl Curve2N {
    pub fn on_curve(&self, point: &AffinePoint2N) -> bool {
        if point.infinity {
            return true;
        }
        let lhs = point.y.square().add(&point.x.mul(&point.y));
        let rhs = point.x.mul(&point.x).mul(&point.x).add(&self.a.mul(&point.x).mul(&point.x)).add(&self.b);
        lhs == rhs
    }

    /// Negation: `-(x, y) = (x, x+y)`.
    pub fn negate(&self, p: &AffinePoint2N) -> AffinePoint2N {
        if p.infinity {
            return p.clone();
        }
        AffinePoint2N::new(p.x.clone(), p.x.add(&p.y))
    }

    /// Point doubling via the standard affine formulas for this curve
    /// shape: `lambda = x + y/x`, `x3 = lambda^2 + lambda + a`,
    /// `y3 = x^2 + (lambda+1)*x3`.
    pub fn double(&self, p: &AffinePoint2N) -> AffinePoint2N {
        if p.infinity || p.x.is_zero() {
            return AffinePoint2N::infinity(&self.modulus);
        }
        let x_inv = p.x.invert().expect("point coordinate is nonzero by the guard above");
        let lambda = p.x.add(&p.y.mul(&x_inv));
        let lambda_sq = lambda.square();
        let x3 = lambda_sq.add(&lambda).add(&self.a);
        let one = GfElement::one(&self.modulus);
        let y3 = p.x.square().add(&lambda.add(&one).mul(&x3));
        AffinePoint2N::new(x3, y3)
    }

    /// Point addition (`p != q`, neither the identity, and not mutual
    /// negatives, all handled as special cases).
    pub fn add(&self, p: &AffinePoint2N, q: &AffinePoint2N) -> AffinePoint2N {
        if p.infinity {
            return q.clone();
        }
        if q.infinity {
            return p.clone();
        }
        if p.x == q.x {
            if p.y == q.y {
                return self.double(p);
            }
            return AffinePoint2N::infinity(&self.modulus);
        }
        let dx_inv = p.x.add(&q.x).invert().expect("x-coordinates differ by the guard above");
        let lambda = p.y.add(&q.y).mul(&dx_inv);
        let lambda_sq = lambda.square();
        let x3 = lambda_sq.add(&lambda).add(&p.x).add(&q.x).add(&self.a);
        let y3 = lambda.mul(&p.x.add(&x3)).add(&x3).add(&p.y);
        AffinePoint2N::new(x3, y3)
    }

    /// Generic scalar multiplication via NAF double-and-add; correct for
    /// any curve, Frobenius descriptor or not.
    pub fn mul_generic(&self, k: &BigInt, point: &AffinePoint2N) -> AffinePoint2N {
        if k.is_zero() || point.infinity {
            return AffinePoint2N::infinity(&self.modulus);
        }
        let naf = integer_naf(k);
        let neg_point = self.negate(point);
        let mut acc = AffinePoint2N::infinity(&self.modulus);
        for &digit in naf.iter().rev() {
            acc = self.double(&acc);
            if digit > 0 {
                acc = self.add(&acc, point);
            } else if digit < 0 {
                acc = self.add(&acc, &neg_point);
            }
        }
        acc
    }

    /// Frobenius map `phi(x,y) = (x^(2^q), y^(2^q))`, computed as `q`
    /// repeated squarings of each coordinate.
    pub fn frobenius(&self, p: &AffinePoint2N, q: u32) -> AffinePoint2N {
        if p.infinity {
            return p.clone();
        }
        let mut x = p.x.clone();
        let mut y = p.y.clone();
        for _ in 0..q {
            x = x.square();
            y = y.square();
        }
        AffinePoint2N::new(x, y)
    }

    /// Scalar multiplication using the Frobenius endomorphism (the
    /// "Mueller" method) when the curve carries a subfield descriptor with
    /// `q == 1` (the Anomalous Binary Curve case, where tau-adic NAF
    /// reduces to Solinas's algorithm). Falls back to [`Self::mul_generic`]
    /// for `q != 1` or curves with no Frobenius descriptor.
    pub fn mul(&self, k: &BigInt, point: &AffinePoint2N) -> AffinePoint2N {
        match self.frobenius {
            Some(FrobeniusParams { q: 1, c }) if c == 1 || c == -1 => {
                self.mul_frobenius_abc(k, point, c)
            }
            _ => self.mul_generic(k, point),
        }
    }

    /// Solinas's tau-adic NAF expansion for `tau^2 - c*tau + 2 = 0`,
    /// `c in {1, -1}` (Algorithm 3.70 in the standard ECC literature),
    /// applied digit-by-digit with Frobenius squaring standing in for the
    /// doubling step.
    fn mul_frobenius_abc(&self, k: &BigInt, point: &AffinePoint2N, c: i64) -> AffinePoint2N {
        let naf = tau_naf_abc(k, c);
        let neg_point = self.negate(point);
        let mut acc = AffinePoint2N::infinity(&self.modulus);
        for &digit in naf.iter().rev() {
            acc = self.frobenius(&acc, 1);
            if digit > 0 {
                acc = self.add(&acc, point);
            } else if digit < 0 {
                acc = self.add(&acc, &neg_point);
            }
        }
        acc
    }
}

/// Plain integer non-adjacent form (least-significant digit first), the
/// same construction used for the prime-field curve's scalar
/// multiplication.
fn integer_naf(k: &BigInt) -> Vec<i32> {
    let mut digits = Vec::with_capacity(k.bit_length() + 1);
    let mut k = k.clone();
    let two = BigInt::from_u64(2);
    let four = BigInt::from_u64(4);
    while !k.is_zero() {
        if k.get_bit(0) {
            let k_mod4 = k.rem_euclid(&four).expect("four is a nonzero fixed modulus");
            let digit = if k_mod4 == BigInt::from_u64(3) { -1i32 } else { 1i32 };
            digits.push(digit);
            k = if digit == 1 { k.sub(&BigInt::from_u64(1)) } else { k.add(&BigInt::from_u64(1)) };
        } else {
            digits.push(0);
        }
        k = k.div_rem(&two).expect("two is a nonzero fixed modulus").0;
    }
    digits
}

/// Computes the tau-adic NAF of `k` for an Anomalous Binary Curve with
/// `tau^2 = c*tau - 2`, `c in {1, -1}`, by maintaining `k = u + v*tau` and
/// repeatedly dividing by `tau`.
fn tau_naf_abc(k: &BigInt, c: i64) -> Vec<i32> {
    let mut u = k.clone();
    let mut v = BigInt::zero();
    let mut digits = Vec::new();
    let four = BigInt::from_u64(4);
    let two = BigInt::from_u64(2);
    let c_big = BigInt::from_i64(c);

    // Bounded as in the spec's note on signed-digit table length
    // (`2*log2(k) + 10`); k is always finite so this terminates.
    let bound = 2 * k.bit_length().max(1) + 10;
    for _ in 0..bound {
        if u.is_zero() && v.is_zero() {
            break;
        }
        let digit = if u.get_bit(0) {
            // alpha = 2 - ((u - 2*v) mod 4), taking the representative in {1, 3}.
            let two_v = two.mul(&v);
            let diff = u.sub(&two_v).rem_euclid(&four).expect("four is a nonzero fixed modulus");
            if diff == BigInt::from_u64(1) { 1i32 } else { -1i32 }
        } else {
            0
        };
        digits.push(digit);
        let u_minus_digit = u.sub(&BigInt::from_i64(digit as i64));
        let half = u_minus_digit.div_rem(&two).expect("two is a nonzero fixed modulus").0;
        let new_u = v.add(&c_big.mul(&half));
        let new_v = half.neg();
        u = new_u;
        v = new_v;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_to_bytes(hex: &str) -> Vec<u8> {
        let hex: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
        let hex = if hex.len() % 2 == 1 { format!("0{hex}") } else { hex };
        hex.as_bytes()
            .chunks(2)
            .map(|c| u8::from_str_radix(std::str::from_utf8(c).unwrap(), 16).unwrap())
            .collect()
    }

    /// The fixed NIST-style `GF(2^113)` curve from the published test
    /// vectors: `x^113 + x^9 + 1`, `a=1, b=1`.
    fn fixed_curve() -> (Curve2N, AffinePoint2N, BigInt) {
        let modulus = Rc::new(GfModulus::new_unchecked(vec![0, 9, 113]));
        let a = GfElement::one(&modulus);
        let b = GfElement::one(&modulus);
        let gx = GfElement::from_bytes_be(&hex_to_bytes("1667979a40ba497e5d5c270780617"), &modulus);
        let gy = GfElement::from_bytes_be(&hex_to_bytes("0f44b4af1ecc2630e08785cebcc15"), &modulus);
        let n = BigInt::from_hex("0ffffffffffffffdbf91af6dea73").unwrap();
        (Curve2N { modulus, a, b, frobenius: None }, AffinePoint2N::new(gx, gy), n)
    }

    #[test]
    fn generator_is_on_curve() {
        let (curve, g, _n) = fixed_curve();
        assert!(curve.on_curve(&g));
    }

    #[test]
    fn order_n_times_generator_is_infinity() {
        let (curve, g, n) = fixed_curve();
        let result = curve.mul_generic(&n, &g);
        assert!(result.infinity);
    }

    #[test]
    fn negate_is_involution() {
        let (curve, g, _n) = fixed_curve();
        let neg = curve.negate(&g);
        assert_eq!(curve.negate(&neg), g);
    }

    #[test]
    fn add_doubles_when_equal() {
        let (curve, g, _n) = fixed_curve();
        assert_eq!(curve.add(&g, &g), curve.double(&g));
    }

    /// Same curve as [`fixed_curve`] (`a=1`, hence `c=-1` in
    /// `tau^2 - c*tau + 2 = 0`), with the Frobenius descriptor attached so
    /// `mul` dispatches to [`Curve2N::mul_frobenius_abc`] instead of
    /// [`Curve2N::mul_generic`].
    fn frobenius_curve() -> (Curve2N, AffinePoint2N, BigInt) {
        let (curve, g, n) = fixed_curve();
        (Curve2N { frobenius: Some(FrobeniusParams { q: 1, c: -1 }), ..curve }, g, n)
    }

    #[test]
    fn frobenius_dispatch_matches_generic_multiplication() {
        let (curve, g, _n) = frobenius_curve();
        for k in [1u64, 2, 3, 4, 9, 50, 1234, 7_654_321] {
            let scalar = BigInt::from_u64(k);
            assert_eq!(curve.mul(&scalar, &g), curve.mul_generic(&scalar, &g), "mismatch for k={k}");
        }
    }

    #[test]
    fn frobenius_dispatch_order_times_generator_is_infinity() {
        let (curve, g, n) = frobenius_curve();
        assert!(curve.mul(&n, &g).infinity);
    }
}
