// tests/crypto_tests.rs
// Hashing, signing and the decoded-transaction validation path.
use weave_dag::crypto::{generate_keypair, hash256, sign_ed25519, verify_ed25519};
use weave_dag::dag::transaction::{Tag, Transaction};
use weave_dag::dag::validation::{validate_transaction, ValidationError};

#[test]
fn hash256_is_deterministic_and_input_sensitive() {
    assert_eq!(hash256(b"weave"), hash256(b"weave"));
    assert_ne!(hash256(b"weave"), hash256(b"weav"));
    assert_ne!(hash256(b""), [0u8; 32]);
}

#[test]
fn ed25519_sign_verify_round_trip() {
    let (key, public) = generate_keypair();
    let message = b"determinism-test-message";
    let sig = sign_ed25519(&key, message);

    assert!(verify_ed25519(&public, &sig, message));
    assert!(!verify_ed25519(&public, &sig, b"another message"));

    let (_, other_public) = generate_keypair();
    assert!(!verify_ed25519(&other_public, &sig, message));
}

fn signed_tx() -> Transaction {
    let (sender_key, sender) = generate_keypair();
    let (creator_key, creator) = generate_keypair();
    let mut tx = Transaction::new(
        sender,
        creator,
        7,
        vec![[4u8; 32]],
        1,
        Tag::Transfer,
        b"anything".to_vec(),
    );
    tx.attach_signatures(&sender_key, &creator_key);
    tx
}

#[test]
fn signed_transaction_validates() {
    assert_eq!(validate_transaction(&signed_tx()), Ok(()));
}

#[test]
fn tampered_field_breaks_the_sender_signature() {
    let mut tx = signed_tx();
    tx.nonce += 1;
    tx.rehash();
    assert_eq!(
        validate_transaction(&tx),
        Err(ValidationError::BadSenderSignature)
    );
}

#[test]
fn wrong_creator_key_breaks_the_creator_signature() {
    let (sender_key, sender) = generate_keypair();
    let (_, creator) = generate_keypair();
    let (imposter_key, _) = generate_keypair();

    let mut tx = Transaction::new(sender, creator, 0, vec![], 0, Tag::Nop, vec![]);
    tx.attach_signatures(&sender_key, &imposter_key);

    assert_eq!(
        validate_transaction(&tx),
        Err(ValidationError::BadCreatorSignature)
    );
}

#[test]
fn duplicate_parents_are_rejected() {
    let (sender_key, sender) = generate_keypair();
    let (creator_key, creator) = generate_keypair();
    let parent = [8u8; 32];
    let mut tx = Transaction::new(
        sender,
        creator,
        0,
        vec![parent, parent],
        1,
        Tag::Nop,
        vec![],
    );
    tx.attach_signatures(&sender_key, &creator_key);

    assert_eq!(
        validate_transaction(&tx),
        Err(ValidationError::DuplicateParent)
    );
}

#[test]
fn signatures_survive_the_wire() {
    let tx = signed_tx();
    let decoded = Transaction::decode(&tx.encode()).expect("decode");
    assert_eq!(validate_transaction(&decoded), Ok(()));
}
