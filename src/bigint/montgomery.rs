//! Montgomery modular exponentiation.
//!
//! The data model describes `mp` as a single machine word,
//! `mp = -m^-1 mod 2^w`. This implementation generalizes that to a
//! multi-word `R = 2^(64*n)` (one word per limb of the modulus) and keeps
//! a single `mp_full = -m^-1 mod R`, which plays the same role in the
//! whole-number formulation of REDC used here. The reduction and
//! exponentiation *results* are identical to the word-at-a-time version;
//! only the internal bookkeeping is coarser-grained, which keeps this
//! module's correctness easy to check against the `BigInt` primitives it
//! is built from instead of a second hand-rolled word loop.

use super::{BigInt, BigIntError};

/// A modulus prepared for Montgomery arithmetic: `m` odd, plus the
/// derived constants `R`, `R^2 mod m`, and `mp_full = -m^-1 mod R`.
pub struct MontgomeryContext {
    modulus: BigInt,
    n_words: usize,
    r: BigInt,
    r2_mod_m: BigInt,
    mp_full: BigInt,
}

impl MontgomeryContext {
    pub fn new(modulus: &BigInt) -> Result<Self, BigIntError> {
        if modulus.is_zero() || !modulus.get_bit(0) {
            return Err(BigIntError::EvenModulus);
        }

        let n_words = modulus.words().len().max(1);
        let r = BigInt::from_u64(1).shl(64 * n_words);

        // mp_full satisfies m * mp_full == -1 (mod R). Equivalently,
        // mp_full = R - (m^-1 mod R).
        let m_inv_mod_r = modulus
            .rem_euclid(&r)?
            .invert(&r)
            .expect("odd modulus is invertible modulo R = 2^(64n)");
        let mp_full = r.sub(&m_inv_mod_r).rem_euclid(&r)?;

        let r_mod_m = r.rem_euclid(modulus)?;
        let r2_mod_m = r_mod_m.mul(&r_mod_m).rem_euclid(modulus)?;

        Ok(MontgomeryContext {
            modulus: modulus.clone(),
            n_words,
            r,
            r2_mod_m,
            mp_full,
        })
    }

    fn low_bits(&self, value: &BigInt) -> BigInt {
        // value mod R, where R = 2^(64*n_words): just truncate the word
        // vector rather than doing a full division.
        let words = value.words();
        let take = words.len().min(self.n_words);
        BigInt::from_parts(false, words[..take].to_vec())
    }

    /// REDC(T) = (T + ((T mod R) * mp_full mod R) * m) / R, with a final
    /// conditional subtraction of `m`.
    fn redc(&self, t: &BigInt) -> BigInt {
        let t_low = self.low_bits(t);
        let u = self.low_bits(&t_low.mul(&self.mp_full));
        let sum = t.add(&u.mul(&self.modulus));
        let mut result = sum.shr(64 * self.n_words);
        if result >= self.modulus {
            result = result.sub(&self.modulus);
        }
        result
    }

    /// Converts `a` (any representative) into Montgomery form `a*R mod m`.
    pub fn to_mont(&self, a: &BigInt) -> Result<BigInt, BigIntError> {
        let am = a.rem_euclid(&self.modulus)?;
        Ok(self.redc(&am.mul(&self.r2_mod_m)))
    }

    /// Converts a Montgomery-form residue back to a plain representative.
    pub fn from_mont(&self, a: &BigInt) -> BigInt {
        self.redc(a)
    }

    /// Montgomery multiplication: given `a*R`, `b*R` in Montgomery form,
    /// returns `a*b*R mod m` (also in Montgomery form).
    pub fn mont_mul(&self, a: &BigInt, b: &BigInt) -> BigInt {
        self.redc(&a.mul(b))
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }
}

/// Sliding-window width selected from the exponent's bit length, per the
/// table (k=2 below 24 bits, growing to k=9 above 14373 bits).
fn window_width(exponent_bits: usize) -> u32 {
    const TABLE: &[(usize, u32)] = &[
        (24, 2),
        (80, 3),
        (240, 4),
        (672, 5),
        (1792, 6),
        (4096, 7),
        (14373, 8),
    ];
    for &(bound, k) in TABLE {
        if exponent_bits < bound {
            return k;
        }
    }
    9
}

/// `g^e mod m`, dispatching to Montgomery sliding-window exponentiation
/// for odd `m` and naive binary powering otherwise.
pub(crate) fn powm(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt, BigIntError> {
    if exponent.is_negative() {
        return Err(BigIntError::NegativeExponent);
    }
    if modulus.is_zero() {
        return Err(BigIntError::DivisionByZero);
    }

    if modulus.get_bit(0) {
        powm_montgomery(base, exponent, modulus)
    } else {
        powm_naive(base, exponent, modulus)
    }
}

/// Naive binary (square-and-multiply) exponentiation, used as the
/// fallback for even moduli and as the cross-check in `tests/bigint.rs`.
pub(crate) fn powm_naive(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt, BigIntError> {
    let mut result = BigInt::from_u64(1).rem_euclid(modulus)?;
    let mut b = base.rem_euclid(modulus)?;
    let bits = exponent.bit_length();
    for i in 0..bits {
        if exponent.get_bit(i) {
            result = result.mul(&b).rem_euclid(modulus)?;
        }
        b = b.mul(&b).rem_euclid(modulus)?;
    }
    Ok(result)
}

fn powm_montgomery(base: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt, BigIntError> {
    let ctx = MontgomeryContext::new(modulus)?;

    if exponent.is_zero() {
        return BigInt::from_u64(1).rem_euclid(modulus);
    }

    let k = window_width(exponent.bit_length()) as usize;
    let table_size = 1usize << (k.saturating_sub(1));

    // Precompute odd powers base^1, base^3, ..., base^(2^(k-1)*2-1) in
    // Montgomery form.
    let base_mont = ctx.to_mont(base)?;
    let base_sq = ctx.mont_mul(&base_mont, &base_mont);
    let mut odd_powers = Vec::with_capacity(table_size);
    odd_powers.push(base_mont.clone());
    for i in 1..table_size {
        let prev = odd_powers[i - 1].clone();
        odd_powers.push(ctx.mont_mul(&prev, &base_sq));
    }

    let one_mont = ctx.to_mont(&BigInt::from_u64(1))?;
    let mut acc = one_mont;

    let bits = exponent.bit_length();
    let mut i = bits as isize - 1;
    while i >= 0 {
        if !exponent.get_bit(i as usize) {
            acc = ctx.mont_mul(&acc, &acc);
            i -= 1;
            continue;
        }

        // Find the window [i, j] of width at most k ending at a set bit.
        let mut j = (i - k as isize + 1).max(0);
        while !exponent.get_bit(j as usize) {
            j += 1;
        }

        for _ in 0..(i - j + 1) {
            acc = ctx.mont_mul(&acc, &acc);
        }

        let mut window_value: usize = 0;
        for b in (j..=i).rev() {
            window_value = (window_value << 1) | (exponent.get_bit(b as usize) as usize);
        }
        let table_index = (window_value - 1) / 2;
        acc = ctx.mont_mul(&acc, &odd_powers[table_index]);

        i = j - 1;
    }

    Ok(ctx.from_mont(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_matches_montgomery() {
        let m = BigInt::from_decimal("1000000000000000000000000000000000000000000000000001041").unwrap();
        assert!(m.get_bit(0));
        let a = BigInt::from_decimal("123456789012345678901234567890").unwrap();
        let e = BigInt::from_decimal("987654321098765432109876543210").unwrap();

        let naive = powm_naive(&a, &e, &m).unwrap();
        let mont = powm(&a, &e, &m).unwrap();
        assert_eq!(naive, mont);
    }

    #[test]
    fn powm_even_modulus_uses_naive_path() {
        let m = BigInt::from_u64(1024);
        let a = BigInt::from_u64(3);
        let e = BigInt::from_u64(17);
        let result = powm(&a, &e, &m).unwrap();
        assert_eq!(result, powm_naive(&a, &e, &m).unwrap());
    }
}
