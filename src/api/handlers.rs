use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{MediaType, WatchProviderResolution},
    services::WatchProviderRequest,
};

use super::AppState;

// Request types

/// Query string of `GET /watch-providers`.
///
/// Every field is optional here so that a missing value produces our own
/// JSON 400 instead of axum's plain-text rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchProvidersQuery {
    pub tmdb_id: Option<String>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub region: Option<String>,
}

impl WatchProvidersQuery {
    fn into_request(self, region_hint: Option<String>) -> AppResult<WatchProviderRequest> {
        let title_id = self
            .tmdb_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Missing or invalid tmdbId or type".to_string()))?;

        let title_id: u64 = title_id.parse().map_err(|_| {
            AppError::InvalidInput(format!("tmdbId must be a positive integer, got '{}'", title_id))
        })?;

        let media_type: MediaType = self
            .media_type
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("Missing or invalid tmdbId or type".to_string()))?
            .parse()?;

        Ok(WatchProviderRequest {
            title_id: title_id.to_string(),
            media_type,
            region_override: self.region,
            region_hint,
        })
    }
}

/// Geo-IP country of the caller, if the edge supplied one
fn region_hint(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    headers
        .get(header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// TMDB path from the proxy's `path` parameter, relative to the API root
fn proxy_path(params: &[(String, String)]) -> AppResult<String> {
    let path = params
        .iter()
        .find(|(key, _)| key == "path")
        .map(|(_, value)| value.trim().trim_start_matches('/'))
        .filter(|path| !path.is_empty())
        .ok_or_else(|| AppError::InvalidInput("TMDB API path is required.".to_string()))?;

    // `%2e` is a dot to the URL parser and `\` a separator, so either can smuggle in `..`
    let escapes_root = path.to_ascii_lowercase().contains("%2e")
        || path.contains('\\')
        || path.split('/').any(|segment| segment == "." || segment == "..");
    if escapes_root {
        return Err(AppError::InvalidInput("Invalid TMDB API path.".to_string()));
    }

    Ok(path.to_string())
}

/// Empty listing the UI renders as "nothing found"
fn empty_listing(path: &str) -> Value {
    if path.contains("search") || path.contains("discover") {
        json!({ "results": [], "page": 1, "total_pages": 1, "total_results": 0 })
    } else {
        json!({ "results": [] })
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Where a title can be streamed, rented or bought for the caller's region
pub async fn get_watch_providers(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<WatchProvidersQuery>,
) -> AppResult<Json<WatchProviderResolution>> {
    let request = query.into_request(region_hint(&headers, &state.region_header))?;

    tracing::info!(
        request_id = %request_id,
        title_id = %request.title_id,
        media_type = %request.media_type,
        region_override = ?request.region_override,
        region_hint = ?request.region_hint,
        "Processing watch providers request"
    );

    let resolution = state
        .watch_providers
        .resolve(&request)
        .await
        .inspect_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "Watch providers request failed");
        })?;

    Ok(Json(resolution))
}

/// Pass-through to TMDB: `GET /tmdb?path=<tmdb path>&<params forwarded as-is>`.
/// Degraded empty listings are built here, after the cache, so they are never stored.
pub async fn tmdb_proxy(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<Value>> {
    let path = proxy_path(&params)?;
    let forwarded: Vec<(String, String)> =
        params.into_iter().filter(|(key, _)| key != "path").collect();

    match state.tmdb_proxy.fetch(&path, &forwarded).await {
        Ok(body) => Ok(Json(body)),
        Err(e @ (AppError::Configuration(_) | AppError::InvalidInput(_))) => Err(e),
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                path = %path,
                error = %e,
                "TMDB proxy request failed, returning empty listing"
            );
            Ok(Json(empty_listing(&path)))
        }
    }
}
