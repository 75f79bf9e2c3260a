//! Diffie-Hellman generate/final over a [`super::DlParams`] parameter set.

use super::{DlParams, PrivateKey};
use crate::bigint::BigInt;
use crate::rng::Csprng;
use std::rc::Rc;

/// The half of a DH exchange kept locally between `generate` and `final`:
/// the exponent `k` and the parameter set it was drawn against.
pub struct DhHandle {
    params: Rc<DlParams>,
    k: BigInt,
}

/// Produces `(handle, e = g^k mod p)`, taking `k` from the parameter's
/// randomizer stack when available and drawing a fresh one otherwise.
pub fn dh_generate(params: Rc<DlParams>, rng: &mut Csprng) -> (DhHandle, Vec<u8>) {
    let randomizer = params.take_randomizer(rng);
    let e = randomizer.gk.to_bytes_be_padded(params.p.byte_size());
    (DhHandle { params, k: randomizer.k }, e)
}

/// Completes the exchange: `(peer_e mod p)^k mod p`, left-padded to
/// `byte_size(p)`.
pub fn dh_final(handle: &DhHandle, peer_e: &[u8]) -> Vec<u8> {
    let peer = BigInt::from_bytes_be(peer_e).rem_euclid(&handle.params.p).expect("p is a fixed positive modulus");
    let shared = peer.powm(&handle.k, &handle.params.p).expect("p is a fixed positive modulus");
    shared.to_bytes_be_padded(handle.params.p.byte_size())
}

/// Unified (authenticated) Diffie-Hellman: in addition to the plain
/// shared value, multiplies in `peer_y^x mod p` (the static-key
/// contribution) and concatenates both field elements, binding the
/// ephemeral exchange to the long-term identity keys.
pub fn dh_final_unified(handle: &DhHandle, peer_e: &[u8], own_key: &PrivateKey, peer_y: &BigInt) -> Vec<u8> {
    let ephemeral = dh_final(handle, peer_e);
    let static_shared = peer_y.powm(&own_key.x, &handle.params.p).expect("p is a fixed positive modulus");
    let mut out = ephemeral;
    out.extend(static_shared.to_bytes_be_padded(handle.params.p.byte_size()));
    out
}
