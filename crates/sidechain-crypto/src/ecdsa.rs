//! # Witness signatures (secp256k1, anchor-chain key format)
//!
//! Round hashes and P2P handshake challenges are signed with the same
//! secp256k1 curve as the anchor chain's account keys , and
//! serialize to the anchor chain's 130-hex-character recoverable signature
//! format: one recovery-id byte followed by the 64-byte `r||s` pair.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization is handled by `k256`'s `sign_recoverable`

use crate::CryptoError;
use k256::ecdsa::{signature::hazmat::PrehashVerifier, RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

/// Compressed secp256k1 public key (33 bytes), hex-encoded on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 33]);

impl Secp256k1PublicKey {
    /// Parse from compressed SEC1 bytes (33 bytes, leading 0x02/0x03).
    pub fn from_bytes(bytes: [u8; 33]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        let bytes: [u8; 33] = raw.try_into().map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(bytes)
    }

    /// Compressed SEC1 bytes.
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    /// Hex-encode the compressed key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Verify a signature over a pre-hashed SHA-256 digest.
    pub fn verify_prehash(
        &self,
        digest: &[u8; 32],
        signature: &Secp256k1Signature,
    ) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;
        let sig =
            Signature::from_slice(&signature.0[1..]).map_err(|_| CryptoError::InvalidSignature)?;
        verifying_key
            .verify_prehash(digest, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Recoverable secp256k1 signature: 1 recovery byte + 64-byte `r||s`, the
/// anchor chain's 65-byte / 130-hex-char wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1Signature([u8; 65]);

impl Secp256k1Signature {
    /// Wrap raw 65 bytes (recovery id || r || s) without validating the
    /// curve points; use [`Self::from_hex`] for untrusted wire input.
    pub fn from_raw(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Parse from the 130-hex-char wire format.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(s).map_err(|_| CryptoError::InvalidSignatureFormat)?;
        let bytes: [u8; 65] = raw
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        Ok(Self(bytes))
    }

    /// Raw bytes (recovery id || r || s).
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Hex-encode to the wire format.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// A witness's secp256k1 keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a random keypair (tests only — witnesses hold a fixed key).
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Load from a raw 32-byte private key (e.g. `ACTIVE_SIGNING_KEY`).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Public key, compressed.
    pub fn public_key(&self) -> Secp256k1PublicKey {
        let sec1 = self.signing_key.verifying_key().to_sec1_bytes();
        let mut bytes = [0u8; 33];
        bytes.copy_from_slice(&sec1[..33]);
        Secp256k1PublicKey(bytes)
    }

    /// Sign a pre-hashed SHA-256 digest, returning a recoverable signature.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Secp256k1Signature, CryptoError> {
        let (sig, recid): (Signature, RecoveryId) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        let mut bytes = [0u8; 65];
        bytes[0] = recid.to_byte();
        bytes[1..].copy_from_slice(&sig.to_bytes());
        Ok(Secp256k1Signature(bytes))
    }

    /// Raw private key bytes, for storage.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sha256;
    use sha2::{Digest, Sha256};

    fn digest(msg: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(msg);
        hasher.finalize().into()
    }

    #[test]
    fn sign_verify_roundtrip() {
        let keypair = Secp256k1KeyPair::generate();
        let d = digest(b"round hash payload");
        let sig = keypair.sign_prehash(&d).unwrap();
        assert!(keypair.public_key().verify_prehash(&d, &sig).is_ok());
    }

    #[test]
    fn wrong_digest_fails() {
        let keypair = Secp256k1KeyPair::generate();
        let sig = keypair.sign_prehash(&digest(b"one")).unwrap();
        assert!(keypair
            .public_key()
            .verify_prehash(&digest(b"two"), &sig)
            .is_err());
    }

    #[test]
    fn deterministic_signatures() {
        let keypair = Secp256k1KeyPair::from_bytes([0xABu8; 32]).unwrap();
        let d = digest(b"deterministic test");
        let sig1 = keypair.sign_prehash(&d).unwrap();
        let sig2 = keypair.sign_prehash(&d).unwrap();
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn hex_roundtrip_is_130_chars() {
        let keypair = Secp256k1KeyPair::generate();
        let sig = keypair.sign_prehash(&digest(b"x")).unwrap();
        let hex = sig.to_hex();
        assert_eq!(hex.len(), 130);
        assert_eq!(Secp256k1Signature::from_hex(&hex).unwrap(), sig);
    }

    #[test]
    fn public_key_hex_roundtrip() {
        let keypair = Secp256k1KeyPair::generate();
        let hex = keypair.public_key().to_hex();
        assert_eq!(Secp256k1PublicKey::from_hex(&hex).unwrap(), keypair.public_key());
    }

    #[test]
    fn round_hash_is_what_gets_signed() {
        let keypair = Secp256k1KeyPair::generate();
        let round_hash = sha256::sha256_hex(b"block-hash-chain");
        let raw = hex::decode(&round_hash).unwrap();
        let d: [u8; 32] = raw.try_into().unwrap();
        let sig = keypair.sign_prehash(&d).unwrap();
        assert!(keypair.public_key().verify_prehash(&d, &sig).is_ok());
    }
}
