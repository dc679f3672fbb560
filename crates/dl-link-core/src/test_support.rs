use dl_crypto::{CryptoError, KeyImporter, LinkSigner, SpkiKeyImporter, VerifyingKey};
use dl_routes::RouteRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use crate::{DeepLinkConfig, Verifier, sign_url};

pub(crate) fn signer() -> LinkSigner {
    LinkSigner::from_secret_key_bytes(&[0x2a_u8; 32]).unwrap()
}

pub(crate) fn verifier(signer: &LinkSigner) -> Verifier {
    Verifier::new(DeepLinkConfig::new(signer.public_key_base64().unwrap()))
}

pub(crate) fn signed_url(signer: &LinkSigner, base: &str, signed_params: Option<&[&str]>) -> Url {
    sign_url(&Url::parse(base).unwrap(), signer, signed_params).unwrap()
}

pub(crate) fn registry() -> RouteRegistry {
    let mut routes = RouteRegistry::default();
    dl_builtin_routes::register_builtin_routes(&mut routes, Some("https://portfolio.test".to_owned()))
        .unwrap();
    routes
}

#[derive(Default)]
pub(crate) struct CountingImporter {
    pub(crate) calls: AtomicUsize,
}

impl KeyImporter for CountingImporter {
    fn import_public_key(&self, spki_der: &[u8]) -> Result<VerifyingKey, CryptoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SpkiKeyImporter.import_public_key(spki_der)
    }
}
