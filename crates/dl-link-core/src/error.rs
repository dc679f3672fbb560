use dl_crypto::CryptoError;

/// Misconfiguration surfaced by the deep-link core. Untrusted input never
/// produces one of these.
#[derive(Debug, thiserror::Error)]
pub enum DeepLinkError {
    #[error("deep link public key is not configured")]
    MissingPublicKey,

    #[error("invalid deep link public key: {0}")]
    InvalidPublicKey(#[source] CryptoError),

    #[error("failed to load manifest flags from {path}: {message}")]
    ManifestFlags { path: String, message: String },

    #[error("failed to sign deep link: {0}")]
    Signing(#[source] CryptoError),
}
