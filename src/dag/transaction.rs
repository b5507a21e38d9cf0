// src/dag/transaction.rs
// Transaction model, canonical wire codec, content identity and the
// criticality primitive. Everything consensus-critical about a transaction's
// byte representation lives here.

use bytes::{Buf, BufMut};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::MAX_PARENTS_PER_TX;
use crate::crypto;

pub const ACCOUNT_ID_LEN: usize = 32;
pub const TRANSACTION_ID_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// An ed25519 public key, doubling as the account identifier.
pub type AccountId = [u8; ACCOUNT_ID_LEN];
/// BLAKE2b-256 digest of a transaction's canonical encoding.
pub type TransactionId = [u8; TRANSACTION_ID_LEN];
pub type Signature = [u8; SIGNATURE_LEN];

/// The closed set of transaction types the ledger knows how to apply.
/// The wire carries a raw byte so unknown tags survive decoding and are
/// rejected at dispatch instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Nop = 0,
    Transfer = 1,
    Contract = 2,
    Stake = 3,
    Batch = 4,
}

impl Tag {
    pub fn from_byte(byte: u8) -> Option<Tag> {
        match byte {
            0 => Some(Tag::Nop),
            1 => Some(Tag::Transfer),
            2 => Some(Tag::Contract),
            3 => Some(Tag::Stake),
            4 => Some(Tag::Batch),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("transaction truncated while reading {0}")]
    Truncated(&'static str),
    #[error("transaction declares {got} parents, protocol allows at most {max}")]
    TooManyParents { got: usize, max: usize },
    #[error("malformed transaction: {0}")]
    Malformed(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: AccountId,
    pub creator: AccountId,

    pub nonce: u64,

    pub parent_ids: Vec<TransactionId>,

    /// Topological depth in the graph; carried on the wire but never part of
    /// how peers address the transaction.
    pub depth: u64,

    pub tag: u8,
    pub payload: Vec<u8>,

    #[serde(with = "hex_sig")]
    pub sender_signature: Signature,
    #[serde(with = "hex_sig")]
    pub creator_signature: Signature,

    /// BLAKE2b-256 of the full canonical encoding. Derived; recomputed on
    /// decode and never trusted from the wire.
    pub id: TransactionId,

    /// BLAKE2b-256 of sender || parent_ids, and its count of leading zero
    /// bits. Both derived, recomputed on decode.
    pub seed: [u8; 32],
    pub seed_len: u16,
}

impl Transaction {
    /// Build a transaction with empty signatures and derived fields filled in.
    pub fn new(
        sender: AccountId,
        creator: AccountId,
        nonce: u64,
        parent_ids: Vec<TransactionId>,
        depth: u64,
        tag: Tag,
        payload: Vec<u8>,
    ) -> Self {
        let mut tx = Transaction {
            sender,
            creator,
            nonce,
            parent_ids,
            depth,
            tag: tag as u8,
            payload,
            sender_signature: [0; SIGNATURE_LEN],
            creator_signature: [0; SIGNATURE_LEN],
            id: [0; TRANSACTION_ID_LEN],
            seed: [0; 32],
            seed_len: 0,
        };
        tx.rehash();
        tx
    }

    /// Canonical encoding. Field order and widths are fixed protocol-wide:
    /// sender, creator, nonce (u64 BE), parent count (u8) + parents,
    /// depth (u64 BE), tag (u8), payload length (u32 BE) + payload,
    /// sender signature, creator signature.
    pub fn encode(&self) -> Vec<u8> {
        self.encode_inner(true, true)
    }

    /// Bytes the sender signs: the encoding with both signatures omitted.
    pub fn sender_signing_bytes(&self) -> Vec<u8> {
        self.encode_inner(false, false)
    }

    /// Bytes the creator signs: the encoding with the sender signature
    /// included and its own omitted. The order protects against signature
    /// substitution and must not change.
    pub fn creator_signing_bytes(&self) -> Vec<u8> {
        self.encode_inner(true, false)
    }

    fn encode_inner(&self, with_sender_sig: bool, with_creator_sig: bool) -> Vec<u8> {
        let size = 2 * ACCOUNT_ID_LEN
            + 8
            + 1
            + self.parent_ids.len() * TRANSACTION_ID_LEN
            + 8
            + 1
            + 4
            + self.payload.len()
            + 2 * SIGNATURE_LEN;
        let mut w = Vec::with_capacity(size);

        w.extend_from_slice(&self.sender);
        w.extend_from_slice(&self.creator);
        w.put_u64(self.nonce);
        w.put_u8(self.parent_ids.len() as u8);
        for parent_id in &self.parent_ids {
            w.extend_from_slice(parent_id);
        }
        w.put_u64(self.depth);
        w.put_u8(self.tag);
        w.put_u32(self.payload.len() as u32);
        w.extend_from_slice(&self.payload);
        if with_sender_sig {
            w.extend_from_slice(&self.sender_signature);
        }
        if with_creator_sig {
            w.extend_from_slice(&self.creator_signature);
        }

        w
    }

    /// Decode a transaction from its canonical encoding, recomputing every
    /// derived field before returning. Bytes past the creator signature are
    /// left unread so callers may decode from a framed stream.
    pub fn decode(bytes: &[u8]) -> Result<Transaction, DecodeError> {
        let mut buf = bytes;

        let sender = read_array::<ACCOUNT_ID_LEN>(&mut buf, "sender")?;
        let creator = read_array::<ACCOUNT_ID_LEN>(&mut buf, "creator")?;

        if buf.remaining() < 8 {
            return Err(DecodeError::Truncated("nonce"));
        }
        let nonce = buf.get_u64();

        if !buf.has_remaining() {
            return Err(DecodeError::Truncated("parent count"));
        }
        let parent_count = buf.get_u8() as usize;
        if parent_count > MAX_PARENTS_PER_TX {
            return Err(DecodeError::TooManyParents {
                got: parent_count,
                max: MAX_PARENTS_PER_TX,
            });
        }
        let mut parent_ids = Vec::with_capacity(parent_count);
        for _ in 0..parent_count {
            parent_ids.push(read_array::<TRANSACTION_ID_LEN>(&mut buf, "parent id")?);
        }

        if buf.remaining() < 8 {
            return Err(DecodeError::Truncated("depth"));
        }
        let depth = buf.get_u64();

        if !buf.has_remaining() {
            return Err(DecodeError::Truncated("tag"));
        }
        let tag = buf.get_u8();

        if buf.remaining() < 4 {
            return Err(DecodeError::Truncated("payload length"));
        }
        let payload_len = buf.get_u32() as usize;
        if buf.remaining() < payload_len {
            return Err(DecodeError::Truncated("payload"));
        }
        let mut payload = vec![0u8; payload_len];
        buf.copy_to_slice(&mut payload);

        let sender_signature = read_array::<SIGNATURE_LEN>(&mut buf, "sender signature")?;
        let creator_signature = read_array::<SIGNATURE_LEN>(&mut buf, "creator signature")?;

        let mut tx = Transaction {
            sender,
            creator,
            nonce,
            parent_ids,
            depth,
            tag,
            payload,
            sender_signature,
            creator_signature,
            id: [0; TRANSACTION_ID_LEN],
            seed: [0; 32],
            seed_len: 0,
        };
        tx.rehash();
        Ok(tx)
    }

    /// Recompute `id`, `seed` and `seed_len` from the other fields. Pure on
    /// everything but the derived fields.
    pub fn rehash(&mut self) -> &mut Self {
        self.id = crypto::hash256(&self.encode());

        let mut seed_src =
            Vec::with_capacity(ACCOUNT_ID_LEN + self.parent_ids.len() * TRANSACTION_ID_LEN);
        seed_src.extend_from_slice(&self.sender);
        for parent_id in &self.parent_ids {
            seed_src.extend_from_slice(parent_id);
        }
        self.seed = crypto::hash256(&seed_src);
        self.seed_len = prefix_len(&self.seed);

        self
    }

    /// Attach both signatures in protocol order (sender first, then creator
    /// over the sender-signed encoding) and refresh the derived fields.
    pub fn attach_signatures(&mut self, sender_key: &SigningKey, creator_key: &SigningKey) {
        self.sender_signature = crypto::sign_ed25519(sender_key, &self.sender_signing_bytes());
        self.creator_signature = crypto::sign_ed25519(creator_key, &self.creator_signing_bytes());
        self.rehash();
    }

    /// Whether this transaction is eligible to anchor a consensus round.
    pub fn is_critical(&self, difficulty: u8) -> bool {
        self.seed_len >= u16::from(difficulty)
    }
}

/// Count of leading zero bits. An all-zero digest scores the full bit width.
pub(crate) fn prefix_len(digest: &[u8]) -> u16 {
    for (i, byte) in digest.iter().enumerate() {
        if *byte != 0 {
            return (i * 8) as u16 + byte.leading_zeros() as u16;
        }
    }
    (digest.len() * 8) as u16
}

fn read_array<const N: usize>(buf: &mut &[u8], what: &'static str) -> Result<[u8; N], DecodeError> {
    if buf.remaining() < N {
        return Err(DecodeError::Truncated(what));
    }
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Signatures serialize as hex strings; serde's array support stops at 32
/// elements and hex keeps JSON dumps readable anyway.
mod hex_sig {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &[u8; 64], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&hex::encode(sig))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<[u8; 64], D::Error> {
        let raw = String::deserialize(de)?;
        let bytes = hex::decode(&raw).map_err(de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| de::Error::custom("signature must be 64 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_len_counts_leading_zero_bits() {
        assert_eq!(prefix_len(&[0x80, 0, 0]), 0);
        assert_eq!(prefix_len(&[0x01, 0, 0]), 7);
        assert_eq!(prefix_len(&[0x00, 0x40, 0]), 9);
        assert_eq!(prefix_len(&[0xFF; 32]), 0);
    }

    #[test]
    fn prefix_len_of_all_zero_digest_is_full_width() {
        assert_eq!(prefix_len(&[0u8; 32]), 256);
    }

    #[test]
    fn tag_round_trips_through_bytes() {
        for tag in [Tag::Nop, Tag::Transfer, Tag::Contract, Tag::Stake, Tag::Batch] {
            assert_eq!(Tag::from_byte(tag as u8), Some(tag));
        }
        assert_eq!(Tag::from_byte(5), None);
        assert_eq!(Tag::from_byte(0xFF), None);
    }

    #[test]
    fn signing_bytes_nest_in_protocol_order() {
        let tx = Transaction::new([3; 32], [4; 32], 1, vec![[9; 32]], 2, Tag::Nop, vec![1, 2]);
        let sender_bytes = tx.sender_signing_bytes();
        let creator_bytes = tx.creator_signing_bytes();
        let full = tx.encode();

        assert_eq!(creator_bytes.len(), sender_bytes.len() + SIGNATURE_LEN);
        assert_eq!(full.len(), creator_bytes.len() + SIGNATURE_LEN);
        assert_eq!(&creator_bytes[..sender_bytes.len()], &sender_bytes[..]);
        assert_eq!(&full[..creator_bytes.len()], &creator_bytes[..]);
    }
}
