use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;
use sha2::{Digest, Sha256};

use crate::bytes::{SIGNATURE_LENGTH, base64_to_bytes};
use crate::{CryptoError, to_hex};

/// Algorithm descriptor for deep-link signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    EcdsaP256Sha256,
}

impl SignatureAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => "ECDSA",
        }
    }

    pub fn named_curve(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => "P-256",
        }
    }

    pub fn hash(&self) -> &'static str {
        match self {
            SignatureAlgorithm::EcdsaP256Sha256 => "SHA-256",
        }
    }
}

/// Turns SPKI DER bytes into a verification key.
pub trait KeyImporter: Send + Sync {
    fn import_public_key(&self, spki_der: &[u8]) -> Result<VerifyingKey, CryptoError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SpkiKeyImporter;

impl KeyImporter for SpkiKeyImporter {
    fn import_public_key(&self, spki_der: &[u8]) -> Result<VerifyingKey, CryptoError> {
        VerifyingKey::from_public_key_der(spki_der)
            .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))
    }
}

/// Everything needed to check a deep-link signature, built once per
/// verifier.
#[derive(Debug, Clone)]
pub struct VerificationTools {
    pub algorithm: SignatureAlgorithm,
    pub verifying_key: VerifyingKey,
    pub key_fingerprint: String,
}

impl VerificationTools {
    /// Decodes a base64 SPKI public key and imports it through `importer`.
    pub fn import(importer: &dyn KeyImporter, public_key_base64: &str) -> Result<Self, CryptoError> {
        let spki_der = base64_to_bytes(public_key_base64)
            .map_err(|err| CryptoError::InvalidPublicKey(format!("key is not base64: {err}")))?;
        let verifying_key = importer.import_public_key(&spki_der)?;

        Ok(Self {
            algorithm: SignatureAlgorithm::EcdsaP256Sha256,
            verifying_key,
            key_fingerprint: key_fingerprint(&spki_der),
        })
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; SIGNATURE_LENGTH]) -> bool {
        verify_p256(&self.verifying_key, message, signature)
    }
}

/// ECDSA P-256 / SHA-256 check of a raw r || s signature.
pub fn verify_p256(key: &VerifyingKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };
    key.verify(message, &signature).is_ok()
}

/// Lowercase hex SHA-256 of the SPKI DER bytes.
pub fn key_fingerprint(spki_der: &[u8]) -> String {
    to_hex(&Sha256::digest(spki_der))
}
