//! DSA signing and verification over a [`super::DlParams`] parameter set.

use super::{DlError, PrivateKey, PublicKey};
use crate::bigint::BigInt;
use crate::rng::Csprng;

/// Signs `digest` (a message digest, or a raw fixed-length buffer if the
/// caller has already hashed/formatted it appropriately) under `key`.
///
/// Returns `r || s`, each left-padded to `byte_size(q)` bytes. Internally
/// retries with a fresh randomizer on the (astronomically unlikely) event
/// that `r` or `s` comes out zero.
pub fn dsa_sign(key: &PrivateKey, digest: &[u8], rng: &mut Csprng) -> Vec<u8> {
    let params = &key.params;
    let e = BigInt::from_bytes_be(digest).rem_euclid(&params.q).expect("q is a fixed positive modulus");

    loop {
        let randomizer = params.take_randomizer(rng);
        let r = randomizer.gk.rem_euclid(&params.q).expect("q is a fixed positive modulus");
        if r.is_zero() {
            continue;
        }

        let k_inv = match randomizer.k.invert(&params.q) {
            Ok(inv) => inv,
            Err(_) => continue,
        };
        let s = k_inv
            .mul(&e.add(&key.x.mul(&r)))
            .rem_euclid(&params.q)
            .expect("q is a fixed positive modulus");
        if s.is_zero() {
            continue;
        }

        let byte_len = params.q.byte_size();
        let mut out = r.to_bytes_be_padded(byte_len);
        out.extend(s.to_bytes_be_padded(byte_len));
        return out;
    }
}

/// Verifies `signature` (as produced by [`dsa_sign`]) over `digest` under
/// `key`. Any out-of-range `r`/`s`, or a mismatched recomputed `v`,
/// returns `Ok(false)` rather than an error — a failed verification is an
/// ordinary outcome, not a programming bug.
pub fn dsa_verify(key: &PublicKey, digest: &[u8], signature: &[u8]) -> Result<bool, DlError> {
    let params = &key.params;
    let byte_len = params.q.byte_size();
    if signature.len() != 2 * byte_len {
        return Ok(false);
    }
    let r = BigInt::from_bytes_be(&signature[..byte_len]);
    let s = BigInt::from_bytes_be(&signature[byte_len..]);

    if r.is_zero() || r >= params.q || s.is_zero() || s >= params.q {
        return Ok(false);
    }

    let e = BigInt::from_bytes_be(digest).rem_euclid(&params.q).expect("q is a fixed positive modulus");
    let w = match s.invert(&params.q) {
        Ok(inv) => inv,
        Err(_) => return Ok(false),
    };
    let u1 = e.mul(&w).rem_euclid(&params.q).expect("q is a fixed positive modulus");
    let u2 = r.mul(&w).rem_euclid(&params.q).expect("q is a fixed positive modulus");

    let gu1 = params.g.powm(&u1, &params.p).expect("p is a fixed positive modulus");
    let yu2 = key.y.powm(&u2, &params.p).expect("p is a fixed positive modulus");
    let v = gu1.mul(&yu2).rem_euclid(&params.p).expect("p is a fixed positive modulus").rem_euclid(&params.q).expect("q is a fixed positive modulus");

    Ok(v == r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlpk::intern_params;
    use crate::hash::sha1;

    /// A DSA-shaped toy group (256-bit `p`, 64-bit `q`, `g` of order `q`):
    /// large enough to exercise full-width modular arithmetic without the
    /// cost of generating real 1024/160-bit parameters in a unit test.
    fn toy_params() -> std::rc::Rc<crate::dlpk::DlParams> {
        let p = BigInt::from_decimal("63756857160552672853696389306371603594830280181178749014411126704562212100471").unwrap();
        let q = BigInt::from_decimal("10346593310245662541").unwrap();
        let g = BigInt::from_decimal("5434484960617839406893524103285454366362747490011001805144053881617246117844").unwrap();
        intern_params(p, g, q, None, None)
    }

    #[test]
    fn sign_then_verify_succeeds() {
        let params = toy_params();
        let mut rng = Csprng::from_seed([7u8; 32]);
        let key = PrivateKey::generate(params, &mut rng);
        let digest = sha1(b"test");
        let sig = dsa_sign(&key, &digest, &mut rng);
        assert!(dsa_verify(&key.public(), &digest, &sig).unwrap());
    }

    #[test]
    fn flipped_signature_byte_fails() {
        let params = toy_params();
        let mut rng = Csprng::from_seed([8u8; 32]);
        let key = PrivateKey::generate(params, &mut rng);
        let digest = sha1(b"test");
        let mut sig = dsa_sign(&key, &digest, &mut rng);
        sig[0] ^= 0xff;
        assert!(!dsa_verify(&key.public(), &digest, &sig).unwrap());
    }

    #[test]
    fn flipped_message_byte_fails() {
        let params = toy_params();
        let mut rng = Csprng::from_seed([9u8; 32]);
        let key = PrivateKey::generate(params, &mut rng);
        let digest = sha1(b"test");
        let sig = dsa_sign(&key, &digest, &mut rng);
        let other_digest = sha1(b"Test");
        assert!(!dsa_verify(&key.public(), &other_digest, &sig).unwrap());
    }
}
