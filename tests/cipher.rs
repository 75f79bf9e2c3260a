use cryptal::cipher::{allocate, native_name, transform, CipherError};

#[test]
fn chacha20_round_trips_through_encrypt_then_decrypt() {
    let key = [0x42u8; 32];
    let iv = [0x11u8; 16];
    let plaintext = b"the quick brown fox jumps over the lazy dog";

    let mut enc = allocate("chacha20", &key, true, false).unwrap();
    enc.set_iv(&iv).unwrap();
    let mut ciphertext = vec![0u8; plaintext.len()];
    transform(enc.as_mut(), &mut ciphertext, plaintext).unwrap();
    assert_ne!(ciphertext, plaintext);

    let mut dec = allocate("chacha20", &key, false, false).unwrap();
    dec.set_iv(&iv).unwrap();
    let mut recovered = vec![0u8; ciphertext.len()];
    transform(dec.as_mut(), &mut recovered, &ciphertext).unwrap();
    assert_eq!(recovered, plaintext);
}

#[test]
fn alias_resolves_to_the_same_algorithm_as_its_canonical_name() {
    assert_eq!(native_name("chacha"), native_name("chacha20"));
    let by_alias = allocate("chacha", &[0x7u8; 32], true, false).unwrap();
    let by_name = allocate("chacha20", &[0x7u8; 32], true, false).unwrap();
    assert_eq!(by_alias.block_bytes(), by_name.block_bytes());
}

#[test]
fn unknown_cipher_name_is_rejected() {
    let err = allocate("not-a-real-cipher", &[0u8; 32], true, false).unwrap_err();
    assert_eq!(err, CipherError::Unsupported);
}

#[test]
fn short_key_is_rejected_unless_expansion_is_requested() {
    let short_key = [0x1u8; 4];
    assert_eq!(allocate("chacha20", &short_key, true, false).unwrap_err(), CipherError::KeyTooShort);
    assert!(allocate("chacha20", &short_key, true, true).is_ok());
}

#[test]
fn none_cipher_passes_plaintext_through_unchanged() {
    let mut instance = allocate("none", &[0u8; 16], true, false).unwrap();
    let data = b"unchanged".to_vec();
    let mut out = vec![0u8; data.len()];
    transform(instance.as_mut(), &mut out, &data).unwrap();
    assert_eq!(out, data);
}
