use axum::{Json, extract::State};
use dl_api_types::{CanonicalizeResponse, DeepLinkUrlRequest, ParseResponse, VerifyResponse};
use dl_link_core::canonicalize as canonical_string;
use tracing::error;

use crate::{AppState, ApiResult, internal_error, parse_url};

pub(crate) async fn canonicalize(
    Json(request): Json<DeepLinkUrlRequest>,
) -> ApiResult<CanonicalizeResponse> {
    let url = parse_url(&request.url)?;
    Ok(Json(CanonicalizeResponse {
        canonical: canonical_string(&url),
    }))
}

pub(crate) async fn verify(
    State(state): State<AppState>,
    Json(request): Json<DeepLinkUrlRequest>,
) -> ApiResult<VerifyResponse> {
    let url = parse_url(&request.url)?;
    let signature = state.core.verify(&url).await.map_err(|err| {
        error!("deep link verification failed: {}", err);
        internal_error(err)
    })?;

    Ok(Json(VerifyResponse { signature }))
}

pub(crate) async fn parse(
    State(state): State<AppState>,
    Json(request): Json<DeepLinkUrlRequest>,
) -> ApiResult<ParseResponse> {
    let url = parse_url(&request.url)?;
    let parsed = state.core.parse(&url).await.map_err(|err| {
        error!("deep link parse failed: {}", err);
        internal_error(err)
    })?;

    let response = match parsed {
        Some(parsed) => ParseResponse {
            matched: true,
            route: Some(parsed.route),
            signature: Some(parsed.signature),
            destination: Some(parsed.destination),
        },
        None => ParseResponse {
            matched: false,
            route: None,
            signature: None,
            destination: None,
        },
    };

    Ok(Json(response))
}
