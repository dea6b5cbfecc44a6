//! Shared test helpers for crypto tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine};
use pocketwall_crypto::{KdfParams, PasswordCipher};

/// Low iteration count so property tests stay fast.
pub fn fast_params() -> KdfParams {
    KdfParams::new(1_000)
}

pub fn fast_cipher() -> PasswordCipher {
    PasswordCipher::new(fast_params())
}

/// Flips one bit of a base64 field, keeping its decoded length.
pub fn flip_bit(field: &str, bit: usize) -> String {
    let mut bytes = STANDARD.decode(field).unwrap();
    let bit = bit % (bytes.len() * 8);
    bytes[bit / 8] ^= 1 << (bit % 8);
    STANDARD.encode(bytes)
}

pub fn decoded_len(field: &str) -> usize {
    STANDARD.decode(field).unwrap().len()
}
