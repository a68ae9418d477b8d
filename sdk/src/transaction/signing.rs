//! Signatures attached to a frozen body.
//!
//! Each (chunk, node) body carries its own [`SignatureSet`]: signatures keyed
//! by the public key that produced them. Signing the same body twice with the
//! same key replaces the old entry, so accumulation is idempotent.
//!
//! On the wire the set becomes a `SignatureMap`. The key prefix is the full
//! raw public key, which is always unambiguous.

use std::collections::BTreeMap;

use prost::Message;

use crate::crypto::{KeyAlgorithm, PrivateKey, PublicKey, Signature};
use crate::error::{Error, Result};
use crate::proto::services;
use crate::proto::services::signature_pair;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet(BTreeMap<PublicKey, Signature>);

impl SignatureSet {
    /// Signs `body_bytes` with `key`, replacing any earlier signature by it.
    pub(crate) fn sign(&mut self, key: &PrivateKey, body_bytes: &[u8]) {
        self.0.insert(key.public_key(), key.sign(body_bytes));
    }

    /// Adds a signature produced elsewhere after checking it covers
    /// `body_bytes`.
    pub(crate) fn insert_verified(
        &mut self,
        public_key: PublicKey,
        signature: Signature,
        body_bytes: &[u8],
    ) -> Result<()> {
        public_key.verify(body_bytes, &signature)?;
        self.0.insert(public_key, signature);
        Ok(())
    }

    pub fn get(&self, public_key: &PublicKey) -> Option<&Signature> {
        self.0.get(public_key)
    }

    pub fn public_keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn to_protobuf(&self) -> services::SignatureMap {
        let sig_pair = self
            .0
            .iter()
            .map(|(key, signature)| services::SignaturePair {
                pub_key_prefix: key.to_bytes_raw(),
                signature: Some(match signature {
                    Signature::Ed25519(bytes) => signature_pair::Signature::Ed25519(bytes.to_vec()),
                    Signature::EcdsaSecp256k1(bytes) => {
                        signature_pair::Signature::EcdsaSecp256k1(bytes.to_vec())
                    }
                }),
            })
            .collect();
        services::SignatureMap { sig_pair }
    }

    pub(crate) fn from_protobuf(pb: services::SignatureMap) -> Result<Self> {
        let mut set = BTreeMap::new();
        for pair in pb.sig_pair {
            let (key, signature) = match pair.signature {
                Some(signature_pair::Signature::Ed25519(sig)) => (
                    PublicKey::from_bytes_ed25519(&pair.pub_key_prefix),
                    Signature::from_bytes(KeyAlgorithm::Ed25519, &sig)?,
                ),
                Some(signature_pair::Signature::EcdsaSecp256k1(sig)) => (
                    PublicKey::from_bytes_ecdsa(&pair.pub_key_prefix),
                    Signature::from_bytes(KeyAlgorithm::EcdsaSecp256k1, &sig)?,
                ),
                None => return Err(Error::decode("signature pair without a signature")),
            };
            let key =
                key.map_err(|_| Error::decode("signature pair prefix is not a full public key"))?;
            set.insert(key, signature);
        }
        Ok(Self(set))
    }
}

/// One body addressed to one node, with its signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SignedBody {
    pub body_bytes: Vec<u8>,
    pub signatures: SignatureSet,
}

impl SignedBody {
    pub fn new(body_bytes: Vec<u8>) -> Self {
        Self {
            body_bytes,
            signatures: SignatureSet::default(),
        }
    }

    /// `SignedTransaction` bytes: what the transaction hash is taken over.
    pub fn signed_transaction_bytes(&self) -> Vec<u8> {
        services::SignedTransaction {
            body_bytes: self.body_bytes.clone(),
            sig_map: Some(self.signatures.to_protobuf()),
        }
        .encode_to_vec()
    }

    pub fn to_protobuf(&self) -> services::Transaction {
        services::Transaction {
            signed_transaction_bytes: self.signed_transaction_bytes(),
        }
    }

    pub fn from_protobuf(pb: services::Transaction) -> Result<Self> {
        let signed = services::SignedTransaction::decode(pb.signed_transaction_bytes.as_slice())?;
        Ok(Self {
            body_bytes: signed.body_bytes,
            signatures: SignatureSet::from_protobuf(signed.sig_map.unwrap_or_default())?,
        })
    }

    /// Checks every signature against the body bytes.
    pub fn verify(&self) -> Result<()> {
        for (key, signature) in &self.signatures.0 {
            key.verify(&self.body_bytes, signature)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resigning_with_the_same_key_replaces() {
        let key = PrivateKey::generate_ed25519();
        let mut set = SignatureSet::default();
        set.sign(&key, b"body");
        set.sign(&key, b"body");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn signatures_survive_the_wire_for_both_curves() {
        let mut body = SignedBody::new(b"frozen body".to_vec());
        body.signatures.sign(&PrivateKey::generate_ed25519(), &body.body_bytes);
        body.signatures.sign(&PrivateKey::generate_ecdsa(), &body.body_bytes);

        let restored = SignedBody::from_protobuf(body.to_protobuf()).unwrap();
        assert_eq!(restored, body);
        restored.verify().unwrap();
    }

    #[test]
    fn foreign_signature_must_cover_the_body() {
        let key = PrivateKey::generate_ecdsa();
        let mut set = SignatureSet::default();
        let wrong = key.sign(b"other bytes");
        assert!(matches!(
            set.insert_verified(key.public_key(), wrong, b"body"),
            Err(Error::Signature(_))
        ));
        set.insert_verified(key.public_key(), key.sign(b"body"), b"body").unwrap();
        assert!(set.get(&key.public_key()).is_some());
    }

    #[test]
    fn truncated_prefix_does_not_decode() {
        let map = services::SignatureMap {
            sig_pair: vec![services::SignaturePair {
                pub_key_prefix: vec![1, 2, 3],
                signature: Some(signature_pair::Signature::Ed25519(vec![0; 64])),
            }],
        };
        assert!(matches!(SignatureSet::from_protobuf(map), Err(Error::Decode(_))));
    }
}
