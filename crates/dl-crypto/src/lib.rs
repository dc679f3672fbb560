mod bytes;
mod keys;

pub use bytes::{
    ENCODED_SIGNATURE_LENGTH, SIGNATURE_LENGTH, base64_to_bytes, bytes_to_sig, decode_sig_fixed,
    sig_to_bytes,
};
pub use keys::{
    KeyImporter, SignatureAlgorithm, SpkiKeyImporter, VerificationTools, key_fingerprint,
    verify_p256,
};
pub use p256::ecdsa::VerifyingKey;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use p256::ecdsa::signature::Signer as _;
use p256::ecdsa::{Signature, SigningKey};
use p256::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("signature must be {expected} bytes, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    #[error("signing failed: {0}")]
    Signing(String),
}

pub trait Signer: Send + Sync {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Issuer-side P-256 key for producing signed deep links.
pub struct LinkSigner {
    signing_key: SigningKey,
}

impl LinkSigner {
    pub fn new_random() -> Self {
        let mut rng = OsRng;
        Self {
            signing_key: SigningKey::random(&mut rng),
        }
    }

    pub fn from_secret_key_bytes(secret_key: &[u8]) -> Result<Self, CryptoError> {
        let signing_key = SigningKey::from_slice(secret_key)
            .map_err(|err| CryptoError::InvalidSecretKey(err.to_string()))?;
        Ok(Self { signing_key })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_spki_der(&self) -> Result<Vec<u8>, CryptoError> {
        let document = self
            .verifying_key()
            .to_public_key_der()
            .map_err(|err| CryptoError::InvalidPublicKey(err.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Standard base64 SPKI, the format verifiers are provisioned with.
    pub fn public_key_base64(&self) -> Result<String, CryptoError> {
        Ok(STANDARD.encode(self.public_key_spki_der()?))
    }

    pub fn public_key_fingerprint(&self) -> Result<String, CryptoError> {
        Ok(key_fingerprint(&self.public_key_spki_der()?))
    }
}

impl Signer for LinkSigner {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if payload.is_empty() {
            return Err(CryptoError::Signing("payload cannot be empty".to_owned()));
        }

        let signature: Signature = self.signing_key.sign(payload);
        let bytes = signature.to_bytes().to_vec();
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }
}

pub(crate) fn to_hex(input: &[u8]) -> String {
    let mut output = String::with_capacity(input.len() * 2);
    for byte in input {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}
