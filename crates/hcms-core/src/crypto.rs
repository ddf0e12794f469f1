//! Ed25519 keys used to sign and check session tokens.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Public half of the token-signing key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ed25519PublicKey(pub [u8; 32]);

impl Ed25519PublicKey {
    /// Check `signature` over `message`.
    ///
    /// Bytes that do not decode to a curve point give `InvalidPublicKey`;
    /// every other failure is `InvalidSignature`.
    pub fn verify(&self, message: &[u8], signature: &Ed25519Signature) -> Result<(), CoreError> {
        let key = VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;
        key.verify(message, &Signature::from_bytes(&signature.0))
            .map_err(|_| CoreError::InvalidSignature)
    }

    /// Short hex prefix for logs.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Pub({})", self.fingerprint())
    }
}

/// Detached signature carried in the last segment of a token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Anything other than exactly 128 hex digits fails.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 64];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", hex::encode(&self.0[..8]))
    }
}

/// The server's token-signing key. `Debug` shows only the public half.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fresh key from the thread RNG. Tokens signed by it die with the process.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Deterministic key, so tokens survive a restart when the seed is kept.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        Ed25519PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_claims_verify_only_unaltered() {
        let keypair = Keypair::generate();
        let signature = keypair.sign(b"claims");

        assert!(keypair.public_key().verify(b"claims", &signature).is_ok());
        assert_eq!(
            keypair.public_key().verify(b"claimz", &signature),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_seeded_keys_are_stable() {
        let seed = [0x42u8; 32];
        assert_eq!(
            Keypair::from_seed(&seed).public_key(),
            Keypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn test_other_key_rejects_signature() {
        let sig = Keypair::from_seed(&[1; 32]).sign(b"claims");
        assert_eq!(
            Keypair::from_seed(&[2; 32]).public_key().verify(b"claims", &sig),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_hex() {
        let sig = Keypair::from_seed(&[7; 32]).sign(b"x");
        assert_eq!(Ed25519Signature::from_hex(&sig.to_hex()).unwrap(), sig);
        assert!(Ed25519Signature::from_hex("abcd").is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = Keypair::from_seed(&[5; 32]);
        let debug = format!("{keypair:?}");
        assert!(debug.starts_with("Keypair(Ed25519Pub("));
        assert!(!debug.contains(&hex::encode([5u8; 32])));
    }
}
