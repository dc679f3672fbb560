use dl_api_types::{DeferredDeepLink, DeferredDeepLinkRoute, Destination};
use dl_routes::RouteRegistry;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use url::Url;

use crate::parse::parse;
use crate::{DeepLinkError, Verifier};

/// Deferred links older than this are dropped.
pub const DEFERRED_LINK_MAX_AGE: Duration = Duration::from_secs(2 * 60 * 60);

/// Turns a deferred deep link into the route to open after onboarding.
///
/// Returns `Ok(None)` for a missing or empty link, a link older than
/// [`DEFERRED_LINK_MAX_AGE`], an unparseable referring link, or one no
/// route accepts. Signature status is not checked here.
pub async fn get_deferred_deep_link_route(
    routes: &RouteRegistry,
    verifier: &Verifier,
    deferred: Option<&DeferredDeepLink>,
) -> Result<Option<DeferredDeepLinkRoute>, DeepLinkError> {
    get_deferred_deep_link_route_at(routes, verifier, deferred, now_epoch_ms()).await
}

/// [`get_deferred_deep_link_route`] with an explicit clock, in epoch ms.
pub async fn get_deferred_deep_link_route_at(
    routes: &RouteRegistry,
    verifier: &Verifier,
    deferred: Option<&DeferredDeepLink>,
    now_epoch_ms: f64,
) -> Result<Option<DeferredDeepLinkRoute>, DeepLinkError> {
    let Some(deferred) = deferred else {
        return Ok(None);
    };

    let Some(referring_link) = deferred
        .referring_link
        .as_deref()
        .filter(|link| !link.is_empty())
    else {
        debug!("deferred deep link has no referring link");
        return Ok(None);
    };

    if !deferred.created_at.is_finite() {
        warn!("deferred deep link has a non-finite createdAt");
        return Ok(None);
    }

    let age_ms = now_epoch_ms - deferred.created_at;
    if age_ms > DEFERRED_LINK_MAX_AGE.as_millis() as f64 {
        warn!("deferred deep link expired {age_ms}ms after capture");
        return Ok(None);
    }

    let url = match Url::parse(referring_link) {
        Ok(url) => url,
        Err(err) => {
            warn!("deferred deep link is not a valid url: {err}");
            return Ok(None);
        }
    };

    let Some(parsed) = parse(routes, verifier, &url).await? else {
        return Ok(None);
    };

    let route = match parsed.destination {
        Destination::Redirect { redirect_to } => DeferredDeepLinkRoute::Redirect {
            url: redirect_to.to_string(),
        },
        Destination::Navigate { path, query } => {
            let query = query.to_query_string();
            let route = if query.is_empty() {
                path
            } else {
                format!("{path}?{query}")
            };
            DeferredDeepLinkRoute::Navigate { route }
        }
    };

    Ok(Some(route))
}

fn now_epoch_ms() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as f64)
        .unwrap_or_default()
}
