//! Deep-link canonicalization, signature verification and dispatch.
//!
//! A link flows through [`canonicalize`] (deterministic signable string),
//! [`Verifier`] (ECDSA P-256 over that string) and [`parse`] (route lookup
//! plus signature status). Deferred links captured before onboarding are
//! replayed through [`get_deferred_deep_link_route`].

mod canonicalize;
mod config;
mod deferred;
mod error;
mod parse;
mod sign;
mod verify;

#[cfg(test)]
mod test_support;

pub use canonicalize::{SIG_PARAM, SIG_PARAMS_PARAM, canonicalize};
pub use config::{DeepLinkConfig, ManifestFlags, TestingFlags};
pub use deferred::{
    DEFERRED_LINK_MAX_AGE, get_deferred_deep_link_route, get_deferred_deep_link_route_at,
};
pub use error::DeepLinkError;
pub use parse::{ParsedDeepLink, parse};
pub use sign::sign_url;
pub use verify::Verifier;

use dl_api_types::{DeferredDeepLink, DeferredDeepLinkRoute, SignatureStatus};
use dl_routes::RouteRegistry;
use dl_storage::{CookieStore, read_deferred_deep_link};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Route table and verifier bundled for callers that handle links end to
/// end.
pub struct DeepLinkCore {
    routes: RouteRegistry,
    verifier: Arc<Verifier>,
}

impl DeepLinkCore {
    pub fn new(routes: RouteRegistry, verifier: Arc<Verifier>) -> Self {
        Self { routes, verifier }
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn verifier(&self) -> &Arc<Verifier> {
        &self.verifier
    }

    pub async fn verify(&self, url: &Url) -> Result<SignatureStatus, DeepLinkError> {
        self.verifier.verify(url).await
    }

    pub async fn parse(&self, url: &Url) -> Result<Option<ParsedDeepLink>, DeepLinkError> {
        parse(&self.routes, &self.verifier, url).await
    }

    pub async fn get_deferred_deep_link_route(
        &self,
        deferred: Option<&DeferredDeepLink>,
    ) -> Result<Option<DeferredDeepLinkRoute>, DeepLinkError> {
        get_deferred_deep_link_route(&self.routes, &self.verifier, deferred).await
    }

    /// Reads the `deferred_deeplink` cookie (bounded by `timeout`) and
    /// resolves it.
    pub async fn resolve_deferred_from_cookies(
        &self,
        store: &dyn CookieStore,
        timeout: Duration,
    ) -> Result<Option<DeferredDeepLinkRoute>, DeepLinkError> {
        let deferred = read_deferred_deep_link(store, timeout).await;
        self.get_deferred_deep_link_route(deferred.as_ref()).await
    }
}
