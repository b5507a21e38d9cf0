// src/crypto.rs
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

type Blake2b256 = Blake2b<U32>;

/// BLAKE2b-256 digest, the protocol's content hash.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// Verify an ed25519 signature against a raw 32-byte public key.
/// Returns true on successful verification, false on any error.
pub fn verify_ed25519(pubkey: &[u8; 32], sig: &[u8; 64], message: &[u8]) -> bool {
    let key = match VerifyingKey::from_bytes(pubkey) {
        Ok(key) => key,
        Err(_) => return false,
    };
    let signature = Signature::from_bytes(sig);
    key.verify(message, &signature).is_ok()
}

pub fn sign_ed25519(key: &SigningKey, message: &[u8]) -> [u8; 64] {
    key.sign(message).to_bytes()
}

/// Fresh ed25519 keypair; the public key doubles as the account identifier.
pub fn generate_keypair() -> (SigningKey, [u8; 32]) {
    let mut rng = rand::rngs::OsRng;
    let key = SigningKey::generate(&mut rng);
    let public = key.verifying_key().to_bytes();
    (key, public)
}
