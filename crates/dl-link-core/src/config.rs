use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::DeepLinkError;

pub const PUBLIC_KEY_ENV: &str = "DEEP_LINK_PUBLIC_KEY";
pub const TEST_MODE_ENV: &str = "IN_TEST";
pub const MANIFEST_FLAGS_ENV: &str = "DEEP_LINK_MANIFEST_FLAGS";

/// Build-time flags shipped with the extension manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFlags {
    #[serde(default)]
    pub testing: Option<TestingFlags>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TestingFlags {
    #[serde(default)]
    pub deep_link_public_key: Option<String>,
}

impl ManifestFlags {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DeepLinkError> {
        let path = path.as_ref();
        let manifest_error = |message: String| DeepLinkError::ManifestFlags {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|err| manifest_error(err.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| manifest_error(err.to_string()))
    }

    pub fn deep_link_public_key(&self) -> Option<&str> {
        self.testing
            .as_ref()
            .and_then(|testing| testing.deep_link_public_key.as_deref())
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Key provisioning for the verifier, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct DeepLinkConfig {
    pub public_key_base64: Option<String>,
    pub is_test_mode: bool,
    pub manifest_flags: ManifestFlags,
}

impl DeepLinkConfig {
    pub fn new(public_key_base64: impl Into<String>) -> Self {
        Self {
            public_key_base64: Some(public_key_base64.into()),
            ..Self::default()
        }
    }

    /// Enables test mode so `testing.deepLinkPublicKey` can override the
    /// configured key.
    pub fn with_test_mode(mut self, manifest_flags: ManifestFlags) -> Self {
        self.is_test_mode = true;
        self.manifest_flags = manifest_flags;
        self
    }

    /// Reads `DEEP_LINK_PUBLIC_KEY`, `IN_TEST` and `DEEP_LINK_MANIFEST_FLAGS`.
    pub fn from_env() -> Result<Self, DeepLinkError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeepLinkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_key_base64 = lookup(PUBLIC_KEY_ENV)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let is_test_mode = lookup(TEST_MODE_ENV)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        let manifest_flags = match lookup(MANIFEST_FLAGS_ENV).filter(|path| !path.trim().is_empty()) {
            Some(path) => ManifestFlags::from_json_file(path.trim())?,
            None => ManifestFlags::default(),
        };

        Ok(Self {
            public_key_base64,
            is_test_mode,
            manifest_flags,
        })
    }

    /// The base64 SPKI key to verify with. The manifest key wins in test
    /// mode; otherwise the configured key is required.
    pub fn resolve_public_key(&self) -> Result<&str, DeepLinkError> {
        if self.is_test_mode {
            if let Some(key) = self.manifest_flags.deep_link_public_key() {
                return Ok(key);
            }
        }

        self.public_key_base64
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(DeepLinkError::MissingPublicKey)
    }
}
