use cryptal::bigint::BigInt;
use cryptal::dlpk::{
    decode_private_key, decode_public_key, dh_final, dh_generate, dsa_sign, dsa_verify,
    encode_private_key, encode_public_key, intern_params, PrivateKey,
};
use cryptal::hash::sha1;
use cryptal::rng::Csprng;

/// A DSA-shaped toy group: 256-bit `p`, 64-bit `q`, `g` of order `q`.
fn toy_params() -> std::rc::Rc<cryptal::dlpk::DlParams> {
    let p = BigInt::from_decimal("63756857160552672853696389306371603594830280181178749014411126704562212100471").unwrap();
    let q = BigInt::from_decimal("10346593310245662541").unwrap();
    let g = BigInt::from_decimal("5434484960617839406893524103285454366362747490011001805144053881617246117844").unwrap();
    intern_params(p, g, q, None, None)
}

#[test]
fn repeated_interning_of_the_same_group_shares_one_allocation() {
    let a = toy_params();
    let b = toy_params();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}

#[test]
fn dsa_round_trip_over_two_independently_generated_keys() {
    let mut rng = Csprng::from_seed([3u8; 32]);
    let key = PrivateKey::generate(toy_params(), &mut rng);
    let digest = sha1(b"a message worth signing");
    let sig = dsa_sign(&key, &digest, &mut rng);
    assert!(dsa_verify(&key.public(), &digest, &sig).unwrap());
}

#[test]
fn diffie_hellman_sides_agree_on_a_shared_secret() {
    let params = toy_params();
    let mut rng_a = Csprng::from_seed([11u8; 32]);
    let mut rng_b = Csprng::from_seed([22u8; 32]);

    let (handle_a, e_a) = dh_generate(std::rc::Rc::clone(&params), &mut rng_a);
    let (handle_b, e_b) = dh_generate(params, &mut rng_b);

    let shared_a = dh_final(&handle_a, &e_b);
    let shared_b = dh_final(&handle_b, &e_a);
    assert_eq!(shared_a, shared_b);
}

#[test]
fn diffie_hellman_with_different_peers_disagrees() {
    let params = toy_params();
    let mut rng_a = Csprng::from_seed([33u8; 32]);
    let mut rng_b = Csprng::from_seed([44u8; 32]);
    let mut rng_c = Csprng::from_seed([55u8; 32]);

    let (handle_a, _) = dh_generate(std::rc::Rc::clone(&params), &mut rng_a);
    let (_, e_b) = dh_generate(std::rc::Rc::clone(&params), &mut rng_b);
    let (_, e_c) = dh_generate(params, &mut rng_c);

    assert_ne!(dh_final(&handle_a, &e_b), dh_final(&handle_a, &e_c));
}

#[test]
fn public_key_survives_an_encode_decode_round_trip() {
    let mut rng = Csprng::from_seed([1u8; 32]);
    let key = PrivateKey::generate(toy_params(), &mut rng).public();
    let encoded = encode_public_key(&key);
    let decoded = decode_public_key(&encoded).unwrap();
    assert_eq!(decoded.y, key.y);
    assert_eq!(decoded.params.p, key.params.p);
}

#[test]
fn private_key_survives_an_encode_decode_round_trip() {
    let mut rng = Csprng::from_seed([2u8; 32]);
    let key = PrivateKey::generate(toy_params(), &mut rng);
    let encoded = encode_private_key(&key);
    let decoded = decode_private_key(&encoded).unwrap();
    assert_eq!(decoded.x, key.x);
    assert_eq!(decoded.y, key.y);
}
