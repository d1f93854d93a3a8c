use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use crate::{application::error::AppError, domain::entities::Tag};

use super::HttpState;

#[derive(Debug, Serialize)]
pub(super) struct InitializeResponse {
    language: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct TagsResponse {
    tags: Vec<Tag>,
}

#[derive(Debug, Serialize)]
pub(super) struct LivestreamTotals {
    livestream_id: i64,
    total_reactions: i64,
    total_tips: i64,
}

pub(super) async fn initialize(
    State(state): State<HttpState>,
) -> Result<Json<InitializeResponse>, AppError> {
    state.reset.reinitialize().await?;
    Ok(Json(InitializeResponse { language: "rust" }))
}

pub(super) async fn health(State(state): State<HttpState>) -> Response {
    match state.store.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            warn!(target = "isupipe::http::health", error = %err, "store ping failed");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub(super) async fn list_tags(State(state): State<HttpState>) -> Json<TagsResponse> {
    let tags = state
        .caches
        .all_tags()
        .into_iter()
        .map(|tag| Tag::clone(&tag))
        .collect();
    Json(TagsResponse { tags })
}

pub(super) async fn user_icon(
    State(state): State<HttpState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let icon = state
        .caches
        .icon_by_username(&username)
        .or_else(|| state.fallback_icon.clone())
        .ok_or(AppError::NotFound)?;

    let etag = HeaderValue::from_str(&format!("\"{}\"", icon.hash_hex()))
        .map_err(|err| AppError::unexpected(format!("invalid etag: {err}")))?;

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| icon.matches_etag(value));
    if not_modified {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        response.headers_mut().insert(ETAG, etag);
        return Ok(response);
    }

    let mut response = Response::new(Body::from(icon.image().clone()));
    let response_headers = response.headers_mut();
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    response_headers.insert(ETAG, etag);
    Ok(response)
}

pub(super) async fn livestream_tags(
    State(state): State<HttpState>,
    Path(livestream_id): Path<i64>,
) -> Json<Vec<Tag>> {
    Json(state.caches.livestream_tags(livestream_id))
}

pub(super) async fn livestream_totals(
    State(state): State<HttpState>,
    Path(livestream_id): Path<i64>,
) -> Result<Json<LivestreamTotals>, AppError> {
    // Totals read zero for unknown ids, so existence comes from the livestream cache.
    if state.caches.livestream(livestream_id).is_none() {
        return Err(AppError::NotFound);
    }

    Ok(Json(LivestreamTotals {
        livestream_id,
        total_reactions: state.caches.livestream_total_reactions(livestream_id),
        total_tips: state.caches.livestream_total_tips(livestream_id),
    }))
}
