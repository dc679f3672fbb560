use dl_api_types::SignatureStatus;
use dl_crypto::{KeyImporter, SIGNATURE_LENGTH, SpkiKeyImporter, VerificationTools, sig_to_bytes};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::canonicalize::{SIG_PARAM, canonicalize};
use crate::{DeepLinkConfig, DeepLinkError};

/// Checks deep-link signatures against the provisioned public key.
///
/// The key is imported on first use and reused for the lifetime of the
/// verifier; concurrent first callers share a single import.
pub struct Verifier {
    config: DeepLinkConfig,
    importer: Arc<dyn KeyImporter>,
    tools: OnceCell<VerificationTools>,
}

impl Verifier {
    pub fn new(config: DeepLinkConfig) -> Self {
        Self::with_importer(config, Arc::new(SpkiKeyImporter))
    }

    pub fn with_importer(config: DeepLinkConfig, importer: Arc<dyn KeyImporter>) -> Self {
        Self {
            config,
            importer,
            tools: OnceCell::new(),
        }
    }

    /// Imports the key if that has not happened yet. A failed import is not
    /// cached.
    pub async fn tools(&self) -> Result<&VerificationTools, DeepLinkError> {
        self.tools
            .get_or_try_init(|| async {
                let public_key = self.config.resolve_public_key()?;
                let tools = VerificationTools::import(self.importer.as_ref(), public_key)
                    .map_err(DeepLinkError::InvalidPublicKey)?;
                info!(
                    fingerprint = %tools.key_fingerprint,
                    test_mode = self.config.is_test_mode,
                    "imported deep link verification key"
                );
                Ok::<_, DeepLinkError>(tools)
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.tools.initialized()
    }

    /// Signature status of `url`.
    ///
    /// Only key misconfiguration is an error; anything wrong with the
    /// signature itself is [`SignatureStatus::Invalid`].
    pub async fn verify(&self, url: &Url) -> Result<SignatureStatus, DeepLinkError> {
        let Some(sig) = url
            .query_pairs()
            .find(|(key, _)| key == SIG_PARAM)
            .map(|(_, value)| value.into_owned())
        else {
            return Ok(SignatureStatus::Missing);
        };

        let bytes = match sig_to_bytes(&sig) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("deep link signature is not base64url: {err}");
                return Ok(SignatureStatus::Invalid);
            }
        };

        let Ok(signature) = <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice()) else {
            warn!(
                "deep link signature has {} bytes, expected {SIGNATURE_LENGTH}",
                bytes.len()
            );
            return Ok(SignatureStatus::Invalid);
        };

        let tools = self.tools().await?;
        let canonical = canonicalize(url);

        if tools.verify(canonical.as_bytes(), &signature) {
            Ok(SignatureStatus::Valid)
        } else {
            debug!("deep link signature does not match {canonical}");
            Ok(SignatureStatus::Invalid)
        }
    }
}
