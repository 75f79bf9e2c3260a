//! Integer square roots, perfect-square detection, modular square roots,
//! and the Kronecker symbol.

use super::{BigInt, BigIntError};

/// Integer square root via Newton's method (floor of the real root).
pub(crate) fn isqrt(n: &BigInt) -> BigInt {
    if n.is_zero() {
        return BigInt::zero();
    }
    debug_assert!(!n.is_negative(), "isqrt is only defined for non-negative values");

    let bits = n.bit_length();
    let mut x = BigInt::from_u64(1).shl(bits / 2 + 1);

    // Standard Newton iteration x_{k+1} = (x_k + n/x_k) / 2 until it stops
    // decreasing.
    loop {
        let (q, _) = n.div_rem(&x).expect("x starts positive and stays positive");
        let next = x.add(&q).shr(1);
        if next >= x {
            break;
        }
        x = next;
    }

    // Newton's method can land one above the true floor; step down.
    while x.mul(&x) > *n {
        x = x.sub(&BigInt::from_u64(1));
    }
    x
}

/// Quick modular residue filters before paying for a full `isqrt` check.
/// A square mod 64 can only take one of 12 values, mod 63 one of 16, etc.
/// These are the classic filters used by GMP-style `is_perfect_square`
/// implementations.
fn passes_residue_filters(n: &BigInt) -> bool {
    const MOD64_SQUARES: [bool; 64] = {
        let mut table = [false; 64];
        let mut i = 0usize;
        while i < 64 {
            table[(i * i) % 64] = true;
            i += 1;
        }
        table
    };
    const fn squares_table<const M: usize>() -> [bool; M] {
        let mut table = [false; M];
        let mut i = 0usize;
        while i < M {
            table[(i * i) % M] = true;
            i += 1;
        }
        table
    }
    const MOD63_SQUARES: [bool; 63] = squares_table::<63>();
    const MOD65_SQUARES: [bool; 65] = squares_table::<65>();
    const MOD11_SQUARES: [bool; 11] = squares_table::<11>();

    let low = (n.words().first().copied().unwrap_or(0) & 63) as usize;
    if !MOD64_SQUARES[low] {
        return false;
    }

    let mod63 = n.rem_euclid(&BigInt::from_u64(63)).expect("63 is a nonzero fixed modulus");
    let idx63 = mod63.words().first().copied().unwrap_or(0) as usize;
    if !MOD63_SQUARES[idx63] {
        return false;
    }

    let mod65 = n.rem_euclid(&BigInt::from_u64(65)).expect("65 is a nonzero fixed modulus");
    let idx65 = mod65.words().first().copied().unwrap_or(0) as usize;
    if !MOD65_SQUARES[idx65] {
        return false;
    }

    let mod11 = n.rem_euclid(&BigInt::from_u64(11)).expect("11 is a nonzero fixed modulus");
    let idx11 = mod11.words().first().copied().unwrap_or(0) as usize;
    if !MOD11_SQUARES[idx11] {
        return false;
    }

    true
}

pub(crate) fn is_perfect_square(n: &BigInt) -> bool {
    if n.is_negative() {
        return false;
    }
    if n.is_zero() {
        return true;
    }
    if !passes_residue_filters(n) {
        return false;
    }
    let r = isqrt(n);
    r.mul(&r) == *n
}

/// Square root of `a` modulo prime `p` (assumes `p` is an odd prime).
/// Uses the `p ≡ 3 (mod 4)` closed form when applicable, the `p ≡ 5 (mod 8)`
/// variant next, and falls back to Tonelli-Shanks otherwise.
pub(crate) fn mod_sqrt(a: &BigInt, p: &BigInt) -> Result<BigInt, BigIntError> {
    let a = a.rem_euclid(p)?;
    if a.is_zero() {
        return Ok(BigInt::zero());
    }
    if kronecker(&a, p) != 1 {
        return Err(BigIntError::NotAResidue);
    }

    let four = BigInt::from_u64(4);
    let p_mod_4 = p.rem_euclid(&four)?;
    if p_mod_4 == BigInt::from_u64(3) {
        let exp = p.add(&BigInt::from_u64(1)).shr(2);
        return a.powm(&exp, p);
    }

    let eight = BigInt::from_u64(8);
    let p_mod_8 = p.rem_euclid(&eight)?;
    if p_mod_8 == BigInt::from_u64(5) {
        // Atkin's formula: b = (2a)^((p-5)/8), i = 2ab^2, r = ab(i-1), all mod p.
        let exp = p.sub(&BigInt::from_u64(5)).shr(3);
        let two_a = a.shl(1).rem_euclid(p)?;
        let b = two_a.powm(&exp, p)?;
        let i = two_a.mul(&b).rem_euclid(p)?.mul(&b).rem_euclid(p)?;
        let r = a.mul(&b).rem_euclid(p)?.mul(&i.sub(&BigInt::from_u64(1))).rem_euclid(p)?;
        return Ok(r);
    }

    tonelli_shanks(&a, p)
}

fn tonelli_shanks(a: &BigInt, p: &BigInt) -> Result<BigInt, BigIntError> {
    let one = BigInt::from_u64(1);
    let two = BigInt::from_u64(2);

    let mut q = p.sub(&one);
    let mut s = 0u32;
    while !q.get_bit(0) {
        q = q.shr(1);
        s += 1;
    }

    if s == 1 {
        let exp = p.add(&one).shr(2);
        return a.powm(&exp, p);
    }

    // Find a quadratic non-residue z.
    let mut z = two.clone();
    let mut attempts = 0u32;
    while kronecker(&z, p) != -1 {
        z = z.add(&one);
        attempts += 1;
        if attempts > 65535 {
            return Err(BigIntError::NotAResidue);
        }
    }

    let mut m = s;
    let mut c = z.powm(&q, p)?;
    let mut t = a.powm(&q, p)?;
    let mut r = a.powm(&q.add(&one).shr(1), p)?;

    loop {
        if t == one {
            return Ok(r);
        }
        let mut i = 0u32;
        let mut t2 = t.clone();
        while t2 != one {
            t2 = t2.mul(&t2).rem_euclid(p)?;
            i += 1;
            if i >= m {
                return Err(BigIntError::NotAResidue);
            }
        }

        let mut b = c.clone();
        for _ in 0..(m - i - 1) {
            b = b.mul(&b).rem_euclid(p)?;
        }
        m = i;
        c = b.mul(&b).rem_euclid(p)?;
        t = t.mul(&c).rem_euclid(p)?;
        r = r.mul(&b).rem_euclid(p)?;
    }
}

/// Kronecker symbol `(a/b)`, extending the Jacobi symbol to even and
/// negative arguments.
pub(crate) fn kronecker(a: &BigInt, b: &BigInt) -> i32 {
    if b.is_zero() {
        return if a.abs() == BigInt::from_u64(1) { 1 } else { 0 };
    }

    let mut a = a.clone();
    let mut b = b.clone();
    let mut result = 1i32;

    if b.is_negative() {
        b = b.neg();
        if a.is_negative() {
            result = -result;
        }
    }

    let mut b_trailing_twos = 0u32;
    while !b.is_zero() && !b.get_bit(0) {
        b = b.shr(1);
        b_trailing_twos += 1;
    }
    if b_trailing_twos % 2 == 1 {
        let a_mod8 = a.rem_euclid(&BigInt::from_u64(8)).unwrap_or_else(|_| BigInt::zero());
        let low = a_mod8.words().first().copied().unwrap_or(0);
        if low == 3 || low == 5 {
            result = -result;
        }
    }

    if a.is_negative() && b.get_bit(0) {
        let b_mod4 = b.rem_euclid(&BigInt::from_u64(4)).unwrap_or_else(|_| BigInt::zero());
        if b_mod4 == BigInt::from_u64(3) {
            result = -result;
        }
    }
    a = a.abs();

    loop {
        if b == BigInt::from_u64(1) {
            return result;
        }
        a = match a.rem_euclid(&b) {
            Ok(r) => r,
            Err(_) => return 0,
        };
        if a.is_zero() {
            return 0;
        }

        let mut a_trailing = 0u32;
        while !a.is_zero() && !a.get_bit(0) {
            a = a.shr(1);
            a_trailing += 1;
        }
        if a_trailing % 2 == 1 {
            let b_mod8 = b.rem_euclid(&BigInt::from_u64(8)).unwrap_or_else(|_| BigInt::zero());
            let low = b_mod8.words().first().copied().unwrap_or(0);
            if low == 3 || low == 5 {
                result = -result;
            }
        }

        let a_mod4 = a.rem_euclid(&BigInt::from_u64(4)).unwrap_or_else(|_| BigInt::zero());
        let b_mod4 = b.rem_euclid(&BigInt::from_u64(4)).unwrap_or_else(|_| BigInt::zero());
        if a_mod4 == BigInt::from_u64(3) && b_mod4 == BigInt::from_u64(3) {
            result = -result;
        }

        std::mem::swap(&mut a, &mut b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_known_values() {
        assert_eq!(isqrt(&BigInt::from_u64(0)), BigInt::zero());
        assert_eq!(isqrt(&BigInt::from_u64(15)), BigInt::from_u64(3));
        assert_eq!(isqrt(&BigInt::from_u64(16)), BigInt::from_u64(4));
        assert_eq!(isqrt(&BigInt::from_u64(17)), BigInt::from_u64(4));
    }

    #[test]
    fn perfect_square_detection() {
        assert!(is_perfect_square(&BigInt::from_u64(144)));
        assert!(!is_perfect_square(&BigInt::from_u64(145)));
        assert!(is_perfect_square(&BigInt::zero()));
    }

    #[test]
    fn mod_sqrt_p_3_mod_4() {
        // p = 11 ≡ 3 (mod 4); 5^2 = 25 ≡ 3 (mod 11).
        let p = BigInt::from_u64(11);
        let a = BigInt::from_u64(3);
        let r = mod_sqrt(&a, &p).unwrap();
        assert_eq!(r.mul(&r).rem_euclid(&p).unwrap(), a);
    }

    #[test]
    fn mod_sqrt_tonelli_shanks_path() {
        // p = 17 ≡ 1 (mod 8), forcing the general Tonelli-Shanks branch.
        let p = BigInt::from_u64(17);
        let a = BigInt::from_u64(2); // 6^2 = 36 = 2*17 + 2
        let r = mod_sqrt(&a, &p).unwrap();
        assert_eq!(r.mul(&r).rem_euclid(&p).unwrap(), a);
    }

    #[test]
    fn kronecker_matches_known_values() {
        assert_eq!(kronecker(&BigInt::from_u64(5), &BigInt::from_u64(11)), 1);
        assert_eq!(kronecker(&BigInt::from_u64(2), &BigInt::from_u64(11)), -1);
        assert_eq!(kronecker(&BigInt::from_u64(0), &BigInt::from_u64(11)), 0);
    }
}
