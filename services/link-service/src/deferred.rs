use axum::{Json, extract::State};
use dl_api_types::{DeferredDeepLink, DeferredResolveResponse};
use tracing::{error, info};

use crate::{AppState, ApiResult, internal_error};

pub(crate) async fn resolve_deferred(
    State(state): State<AppState>,
    Json(deferred): Json<DeferredDeepLink>,
) -> ApiResult<DeferredResolveResponse> {
    let route = state
        .core
        .get_deferred_deep_link_route(Some(&deferred))
        .await
        .map_err(|err| {
            error!("deferred deep link resolution failed: {}", err);
            internal_error(err)
        })?;

    Ok(Json(DeferredResolveResponse { route }))
}

pub(crate) async fn resolve_deferred_from_cookies(
    State(state): State<AppState>,
) -> ApiResult<DeferredResolveResponse> {
    let route = state
        .core
        .resolve_deferred_from_cookies(state.cookies.as_ref(), state.cookie_timeout)
        .await
        .map_err(|err| {
            error!("deferred deep link resolution from cookies failed: {}", err);
            internal_error(err)
        })?;

    if route.is_some() {
        info!("resolved deferred deep link from cookie jar");
    }

    Ok(Json(DeferredResolveResponse { route }))
}
