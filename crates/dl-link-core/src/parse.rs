use dl_api_types::{Destination, SignatureStatus};
use dl_routes::RouteRegistry;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::canonicalize::{SIG_PARAMS_PARAM, canonical_params};
use crate::{DeepLinkError, Verifier};

/// A deep link that matched a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDeepLink {
    pub destination: Destination,
    pub signature: SignatureStatus,
    /// Lowercased pathname of the matched route.
    pub route: String,
}

/// Dispatches `url` to its route and reports the signature status.
///
/// `Ok(None)` means no route matched or the handler rejected the
/// parameters. The destination is returned whatever the signature status;
/// trust decisions belong to the caller.
pub async fn parse(
    routes: &RouteRegistry,
    verifier: &Verifier,
    url: &Url,
) -> Result<Option<ParsedDeepLink>, DeepLinkError> {
    let pathname = url.path().to_lowercase();
    let Some(route) = routes.route(&pathname) else {
        debug!("no deep link route for pathname {pathname}");
        return Ok(None);
    };

    let mut params = canonical_params(url);
    params.remove(SIG_PARAMS_PARAM);

    let destination = match route.handle(&params) {
        Ok(destination) => destination,
        Err(err) => {
            warn!("deep link route {pathname} rejected its parameters: {err}");
            return Ok(None);
        }
    };

    let signature = verifier.verify(url).await?;

    Ok(Some(ParsedDeepLink {
        destination,
        signature,
        route: pathname,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CountingImporter, registry, signed_url, signer, verifier};
    use crate::DeepLinkConfig;
    use dl_api_types::QueryParams;
    use dl_routes::{DispatchError, FnRoute};
    use std::sync::Arc;
    use std::sync::Mutex;

    #[tokio::test]
    async fn unknown_pathname_is_none() {
        let verifier = verifier(&signer());
        let url = Url::parse("https://example.com/unknown").unwrap();
        assert!(parse(&registry(), &verifier, &url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signed_link_dispatches_as_valid() {
        let signer = signer();
        let verifier = verifier(&signer);
        let url = signed_url(&signer, "https://link.example/swap?from=a&amount=2", None);

        let parsed = parse(&registry(), &verifier, &url).await.unwrap().unwrap();
        assert_eq!(parsed.signature, SignatureStatus::Valid);
        assert_eq!(parsed.route, "/swap");
        let Destination::Navigate { path, query } = parsed.destination else {
            panic!("expected navigate");
        };
        assert_eq!(path, "/cross-chain/swaps/prepare-swap-page");
        assert_eq!(query.get("amount"), Some("2"));
        assert_eq!(query.get("swaps"), Some("true"));
    }

    #[tokio::test]
    async fn pathname_match_ignores_case() {
        let verifier = verifier(&signer());
        let url = Url::parse("https://link.example/HoMe?x=1").unwrap();
        let parsed = parse(&registry(), &verifier, &url).await.unwrap().unwrap();
        assert_eq!(parsed.route, "/home");
        assert_eq!(parsed.signature, SignatureStatus::Missing);
    }

    #[tokio::test]
    async fn invalid_signature_still_dispatches() {
        let verifier = verifier(&signer());
        let mut url = signed_url(&signer(), "https://link.example/home?x=1", None);
        url.query_pairs_mut().append_pair("x", "2");

        let parsed = parse(&registry(), &verifier, &url).await.unwrap().unwrap();
        assert_eq!(parsed.signature, SignatureStatus::Invalid);
        assert!(matches!(parsed.destination, Destination::Navigate { .. }));
    }

    #[tokio::test]
    async fn handler_error_is_none() {
        let verifier = verifier(&signer());
        let url = Url::parse("https://link.example/swap?amount=lots").unwrap();
        assert!(parse(&registry(), &verifier, &url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn handler_error_skips_verification() {
        let importer = Arc::new(CountingImporter::default());
        let verifier = Verifier::with_importer(DeepLinkConfig::default(), importer.clone());
        let url = signed_url(&signer(), "https://link.example/swap?amount=lots", None);
        assert!(parse(&registry(), &verifier, &url).await.unwrap().is_none());
        assert!(!verifier.is_initialized());
    }

    #[tokio::test]
    async fn handler_sees_canonical_params_without_metadata() {
        let seen = Arc::new(Mutex::new(None::<QueryParams>));
        let captured = seen.clone();
        let mut routes = RouteRegistry::default();
        routes.register(Arc::new(FnRoute::new("/capture", move |params: &QueryParams| {
            if let Ok(mut slot) = captured.lock() {
                *slot = Some(params.clone());
            }
            Ok::<_, DispatchError>(Destination::Navigate {
                path: "/".to_owned(),
                query: params.clone(),
            })
        })));

        let signer = signer();
        let verifier = verifier(&signer);
        let mut url = signed_url(&signer, "https://link.example/capture?b=2&a=1", Some(&["a", "b"]));
        url.query_pairs_mut().append_pair("utm", "x");

        let parsed = parse(&routes, &verifier, &url).await.unwrap().unwrap();
        assert_eq!(parsed.signature, SignatureStatus::Valid);

        let params = seen.lock().unwrap().clone().unwrap();
        assert_eq!(params.to_query_string(), "a=1&b=2");
    }

    #[tokio::test]
    async fn unsigned_params_are_all_passed_when_no_allow_list() {
        let verifier = verifier(&signer());
        let url = Url::parse("https://link.example/home?z=1&sig=short&a=2").unwrap();
        let parsed = parse(&registry(), &verifier, &url).await.unwrap().unwrap();
        assert_eq!(parsed.signature, SignatureStatus::Invalid);
        let Destination::Navigate { query, .. } = parsed.destination else {
            panic!("expected navigate");
        };
        assert_eq!(query.to_query_string(), "a=2&z=1");
    }

    #[tokio::test]
    async fn missing_key_propagates_for_signed_links() {
        let verifier = Verifier::new(DeepLinkConfig::default());
        let url = signed_url(&signer(), "https://link.example/home", None);
        assert!(parse(&registry(), &verifier, &url).await.is_err());

        let unsigned = Url::parse("https://link.example/home").unwrap();
        assert!(parse(&registry(), &verifier, &unsigned).await.unwrap().is_some());
    }
}
