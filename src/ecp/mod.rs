//! Elliptic curves `y^2 = x^3 + ax + b` over `GF(p)`: affine points for
//! storage/interchange, Jacobian projective coordinates for the scalar
//! multiplication hot path, point compression, and full parameter
//! verification.

use crate::bigint::BigInt;
use std::fmt;

/// Failure kinds for curve operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveError {
    /// `restore_y` found no square root for the candidate `x`.
    NoSuchPoint,
    /// `verify_param` rejected the curve or point.
    ParameterInvalid,
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::NoSuchPoint => write!(f, "no point on the curve has that x-coordinate"),
            CurveError::ParameterInvalid => write!(f, "curve parameters failed verification"),
        }
    }
}

impl std::error::Error for CurveError {}

/// `y^2 = x^3 + ax + b (mod p)`.
#[derive(Clone, Debug)]
pub struct CurveP {
    pub p: BigInt,
    pub a: BigInt,
    pub b: BigInt,
}

/// An affine point, `z=0` representing the point at infinity (identity).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: BigInt,
    pub y: BigInt,
    pub infinity: bool,
}

impl AffinePoint {
    pub fn infinity() -> Self {
        AffinePoint { x: BigInt::zero(), y: BigInt::zero(), infinity: true }
    }

    pub fn new(x: BigInt, y: BigInt) -> Self {
        AffinePoint { x, y, infinity: false }
    }

    fn to_jacobian(&self) -> JacobianPoint {
        if self.infinity {
            JacobianPoint::infinity()
        } else {
            JacobianPoint { x: self.x.clone(), y: self.y.clone(), z: BigInt::from_u64(1) }
        }
    }
}

/// Jacobian projective coordinates: affine equivalent is `(X/Z^2, Y/Z^3)`.
#[derive(Clone, Debug)]
struct JacobianPoint {
    x: BigInt,
    y: BigInt,
    z: BigInt,
}

impl JacobianPoint {
    fn infinity() -> Self {
        JacobianPoint { x: BigInt::from_u64(1), y: BigInt::from_u64(1), z: BigInt::zero() }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    fn to_affine(&self, curve: &CurveP) -> AffinePoint {
        if self.is_infinity() {
            return AffinePoint::infinity();
        }
        let z_inv = self.z.invert(&curve.p).expect("jacobian Z is a unit modulo a prime");
        let z_inv2 = z_inv.mul(&z_inv).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus");
        let z_inv3 = z_inv2.mul(&z_inv).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus");
        let x = self.x.mul(&z_inv2).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus");
        let y = self.y.mul(&z_inv3).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus");
        AffinePoint::new(x, y)
    }

    /// Standard Jacobian doubling for `a`-general Weierstrass curves.
    fn double(&self, curve: &CurveP) -> JacobianPoint {
        let p = &curve.p;
        if self.is_infinity() || self.y.is_zero() {
            return JacobianPoint::infinity();
        }
        let xx = self.x.mul(&self.x).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let yy = self.y.mul(&self.y).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let yyyy = yy.mul(&yy).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let zz = self.z.mul(&self.z).rem_euclid(p).expect("p is a fixed nonzero prime modulus");

        let s = BigInt::from_u64(4).mul(&self.x).mul(&yy).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let m = BigInt::from_u64(3)
            .mul(&xx)
            .add(&curve.a.mul(&zz).mul(&zz))
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");

        let t = m.mul(&m).sub(&BigInt::from_u64(2).mul(&s)).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let y3 = m
            .mul(&s.sub(&t))
            .sub(&BigInt::from_u64(8).mul(&yyyy))
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");
        let z3 = BigInt::from_u64(2)
            .mul(&self.y)
            .mul(&self.z)
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");

        JacobianPoint { x: t, y: y3, z: z3 }
    }

    /// General Jacobian addition, specialised to mixed addition (`other.z
    /// == 1`) when applicable, since that is the common case when adding a
    /// precomputed affine odd multiple into the sliding-window accumulator.
    fn add(&self, other: &JacobianPoint, curve: &CurveP) -> JacobianPoint {
        let p = &curve.p;
        if self.is_infinity() {
            return other.clone();
        }
        if other.is_infinity() {
            return self.clone();
        }

        let z1z1 = self.z.mul(&self.z).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let z2z2 = other.z.mul(&other.z).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let u1 = self.x.mul(&z2z2).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let u2 = other.x.mul(&z1z1).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let s1 = self.y.mul(&other.z).mul(&z2z2).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let s2 = other.y.mul(&self.z).mul(&z1z1).rem_euclid(p).expect("p is a fixed nonzero prime modulus");

        if u1 == u2 {
            if s1 != s2 {
                return JacobianPoint::infinity();
            }
            return self.double(curve);
        }

        let h = u2.sub(&u1).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let i = BigInt::from_u64(4).mul(&h).mul(&h).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let j = h.mul(&i).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let r = BigInt::from_u64(2).mul(&s2.sub(&s1)).rem_euclid(p).expect("p is a fixed nonzero prime modulus");
        let v = u1.mul(&i).rem_euclid(p).expect("p is a fixed nonzero prime modulus");

        let x3 = r
            .mul(&r)
            .sub(&j)
            .sub(&BigInt::from_u64(2).mul(&v))
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");
        let y3 = r
            .mul(&v.sub(&x3))
            .sub(&BigInt::from_u64(2).mul(&s1).mul(&j))
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");
        let z3 = BigInt::from_u64(2)
            .mul(&self.z)
            .mul(&other.z)
            .mul(&h)
            .rem_euclid(p)
            .expect("p is a fixed nonzero prime modulus");

        JacobianPoint { x: x3, y: y3, z: z3 }
    }

    fn negate(&self, curve: &CurveP) -> JacobianPoint {
        JacobianPoint { x: self.x.clone(), y: curve.p.sub(&self.y).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus"), z: self.z.clone() }
    }
}

impl CurveP {
    /// Whether `point` satisfies the curve equation.
    pub fn on_curve(&self, point: &AffinePoint) -> bool {
        if point.infinity {
            return true;
        }
        let lhs = point.y.mul(&point.y).rem_euclid(&self.p).expect("p is a fixed nonzero prime modulus");
        let rhs = point
            .x
            .mul(&point.x)
            .mul(&point.x)
            .add(&self.a.mul(&point.x))
            .add(&self.b)
            .rem_euclid(&self.p)
            .expect("p is a fixed nonzero prime modulus");
        lhs == rhs
    }

    /// Scalar multiplication `[k]P`, via signed-digit (NAF) sliding-window
    /// double-and-add over precomputed odd multiples.
    pub fn mul(&self, k: &BigInt, point: &AffinePoint) -> AffinePoint {
        if k.is_zero() || point.infinity {
            return AffinePoint::infinity();
        }
        let naf = non_adjacent_form(k);
        let window_size = 4usize;
        let table = precompute_odd_multiples(self, point, window_size);

        let mut acc = JacobianPoint::infinity();
        for &digit in naf.iter().rev() {
            acc = acc.double(self);
            if digit > 0 {
                let idx = (digit as usize - 1) / 2;
                acc = acc.add(&table[idx], self);
            } else if digit < 0 {
                let idx = ((-digit) as usize - 1) / 2;
                acc = acc.add(&table[idx].negate(self), self);
            }
        }
        acc.to_affine(self)
    }

    pub fn add(&self, a: &AffinePoint, b: &AffinePoint) -> AffinePoint {
        a.to_jacobian().add(&b.to_jacobian(), self).to_affine(self)
    }

    pub fn negate(&self, a: &AffinePoint) -> AffinePoint {
        if a.infinity {
            return a.clone();
        }
        AffinePoint::new(a.x.clone(), self.p.sub(&a.y).rem_euclid(&self.p).expect("p is a fixed nonzero prime modulus"))
    }

    /// Decompresses `x` into a point, choosing the root whose least
    /// significant bit equals `bit`.
    pub fn restore_y(&self, x: &BigInt, bit: bool) -> Result<AffinePoint, CurveError> {
        let rhs = x
            .mul(x)
            .mul(x)
            .add(&self.a.mul(x))
            .add(&self.b)
            .rem_euclid(&self.p)
            .expect("p is a fixed nonzero prime modulus");
        let y = rhs.mod_sqrt(&self.p).map_err(|_| CurveError::NoSuchPoint)?;
        let y = if y.get_bit(0) == bit { y } else { self.p.sub(&y).rem_euclid(&self.p).expect("p is a fixed nonzero prime modulus") };
        Ok(AffinePoint::new(x.clone(), y))
    }

    /// Full parameter verification per the published checklist: primality
    /// of `p` and `n`, `n < p`, `n | #e`, the point lies on the curve,
    /// non-singularity, non-supersingularity, non-anomaly, the MOV
    /// condition, and `[n]P = infinity`.
    pub fn verify_param(&self, point: &AffinePoint, n: &BigInt, curve_order: &BigInt) -> bool {
        const MOV_THRESHOLD: usize = 500;

        if self.p.sign() <= 0 || !self.p.is_probable_prime(20) {
            return false;
        }
        if n.sign() <= 0 || !n.is_probable_prime(20) {
            return false;
        }
        if n >= &self.p {
            return false;
        }
        if curve_order.rem_euclid(n).map(|r| !r.is_zero()).unwrap_or(true) {
            return false;
        }
        if point.x.sign() < 0 || point.x >= self.p || point.y.sign() < 0 || point.y >= self.p {
            return false;
        }
        if !self.on_curve(point) {
            return false;
        }

        let four_a3 = BigInt::from_u64(4).mul(&self.a).mul(&self.a).mul(&self.a);
        let twenty_seven_b2 = BigInt::from_u64(27).mul(&self.b).mul(&self.b);
        let discriminant = four_a3.add(&twenty_seven_b2).rem_euclid(&self.p).expect("p is a fixed nonzero prime modulus");
        if discriminant.is_zero() {
            return false;
        }

        let t = self.p.add(&BigInt::from_u64(1)).sub(curve_order);
        let t_sq = t.mul(&t);
        let supersingular = [
            BigInt::zero(),
            self.p.clone(),
            BigInt::from_u64(2).mul(&self.p),
            BigInt::from_u64(3).mul(&self.p),
            BigInt::from_u64(4).mul(&self.p),
        ]
        .iter()
        .any(|v| &t_sq == v);
        if supersingular {
            return false;
        }

        if curve_order == &self.p || n == &self.p {
            return false;
        }

        let mut power = self.p.rem_euclid(n).expect("p is a fixed nonzero prime modulus");
        for _ in 1..=MOV_THRESHOLD {
            if power == BigInt::from_u64(1) {
                return false;
            }
            power = power.mul(&self.p).rem_euclid(n).expect("p is a fixed nonzero prime modulus");
        }

        if !self.mul(n, point).infinity {
            return false;
        }

        let cofactor = curve_order.div_rem(n).expect("n divides curve_order, checked above").0;
        let mut rng = crate::rng::Csprng::from_os();
        for _ in 0..4 {
            let q = random_point_on_curve(self, &mut rng);
            let r = self.mul(&cofactor, &q);
            if !self.mul(n, &r).infinity {
                return false;
            }
        }

        true
    }
}

/// Draws a uniformly random `x` in `[0, p)` and decompresses it (with a
/// randomly chosen parity bit), retrying on `x` values with no point,
/// until a point on `curve` is found. Used only by `verify_param`'s final
/// cofactor check, where "a random point on the curve" is all that is
/// required.
fn random_point_on_curve(curve: &CurveP, rng: &mut crate::rng::Csprng) -> AffinePoint {
    let byte_len = curve.p.byte_size().max(1);
    loop {
        let mut buf = vec![0u8; byte_len];
        rng.fill_bytes(&mut buf);
        let x = BigInt::from_bytes_be(&buf).rem_euclid(&curve.p).expect("p is a fixed nonzero prime modulus");
        let bit = buf.last().map(|b| b & 1 == 1).unwrap_or(false);
        if let Ok(point) = curve.restore_y(&x, bit) {
            return point;
        }
    }
}

/// Non-adjacent form: a signed-digit representation with no two adjacent
/// non-zero digits, least-significant digit first.
fn non_adjacent_form(k: &BigInt) -> Vec<i32> {
    let mut digits = Vec::with_capacity(k.bit_length() + 1);
    let mut k = k.clone();
    let two = BigInt::from_u64(2);
    let four = BigInt::from_u64(4);

    while !k.is_zero() {
        if k.get_bit(0) {
            let k_mod4 = k.rem_euclid(&four).expect("p is a fixed nonzero prime modulus");
            let digit = if k_mod4 == BigInt::from_u64(3) { -1i32 } else { 1i32 };
            digits.push(digit);
            k = if digit == 1 { k.sub(&BigInt::from_u64(1)) } else { k.add(&BigInt::from_u64(1)) };
        } else {
            digits.push(0);
        }
        k = k.div_rem(&two).expect("p is a fixed nonzero prime modulus").0;
    }
    digits
}

fn precompute_odd_multiples(curve: &CurveP, point: &AffinePoint, window: usize) -> Vec<JacobianPoint> {
    let count = 1usize << (window - 1);
    let p_jac = point.to_jacobian();
    let double = p_jac.double(curve);
    let mut table = Vec::with_capacity(count);
    table.push(p_jac);
    for i in 1..count {
        let prev = table[i - 1].clone();
        table.push(prev.add(&double, curve));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_curve() -> (CurveP, AffinePoint, BigInt) {
        let p = BigInt::from_decimal("31407857097127860965216287356072559134859825543").unwrap();
        let a = BigInt::from_decimal("2731256435122317801261871679028549091389013906").unwrap();
        let b = BigInt::from_decimal("10714317566020843022911894761291265613594418240").unwrap();
        let gx = BigInt::from_decimal("16392655484387136812157475999461840857228033620").unwrap();
        let gy = BigInt::from_decimal("2799086322187201568878931628895797117411224036").unwrap();
        let n = BigInt::from_decimal("402664834578562320066877277158309861914083371").unwrap();
        (CurveP { p, a, b }, AffinePoint::new(gx, gy), n)
    }

    #[test]
    fn generator_is_on_curve() {
        let (curve, g, _n) = fixed_curve();
        assert!(curve.on_curve(&g));
    }

    #[test]
    fn order_n_times_generator_is_infinity() {
        let (curve, g, n) = fixed_curve();
        let result = curve.mul(&n, &g);
        assert!(result.infinity);
    }

    #[test]
    fn n_minus_one_times_g_plus_g_is_infinity() {
        let (curve, g, n) = fixed_curve();
        let n_minus_1 = n.sub(&BigInt::from_u64(1));
        let p1 = curve.mul(&n_minus_1, &g);
        let sum = curve.add(&p1, &g);
        assert!(sum.infinity);
    }

    #[test]
    fn restore_y_round_trips() {
        let (curve, g, _n) = fixed_curve();
        let restored = curve.restore_y(&g.x, g.y.get_bit(0)).unwrap();
        assert_eq!(restored, g);
    }
}
