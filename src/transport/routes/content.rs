use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::{
    cache::Cache, common::errors::ApiError, server::AppState, stream::types::MediaType,
};

/// Cache-aside read for the glue routes: a hit short-circuits the whole
/// handler with the stored JSON.
fn cached_json(state: &AppState, key: &str) -> Option<Response> {
    let stored = state.cache.get(key)?;
    let value: Value = serde_json::from_str(&stored).ok()?;
    info!("cache HIT for {key}");
    Some(Json(value).into_response())
}

fn store_json<T: Serialize>(state: &AppState, key: &str, value: &T) {
    if let Ok(serialized) = serde_json::to_string(value) {
        state.cache.set(key, serialized, state.catalog_ttl());
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    title: Option<String>,
}

/// GET /content/search?title=...
pub async fn search(
    Query(params): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    const PATH: &str = "/content/search";
    let Some(title) = params.title.filter(|t| !t.trim().is_empty()) else {
        return ApiError::bad_request("title query parameter is required", PATH).into_response();
    };

    let cache_key = format!("search-list-{}", title.trim().to_lowercase());
    if let Some(hit) = cached_json(&state, &cache_key) {
        return hit;
    }

    match state.fmovies.search(&title).await {
        Ok(results) if results.is_empty() => {
            ApiError::not_found("content not found", PATH).into_response()
        }
        Ok(results) => {
            store_json(&state, &cache_key, &results);
            Json(results).into_response()
        }
        Err(e) => {
            error!("search for '{title}' failed: {e}");
            ApiError::internal("search against the catalog failed", PATH).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct MetadataQuery {
    id: Option<String>,
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataResponse {
    fmovies_id: String,
    title: String,
    #[serde(rename = "type")]
    kind: String,
    year: Option<String>,
    overview: Option<String>,
    poster_url: Option<String>,
    tmdb_id: Option<u64>,
}

/// GET /content/metadata?id=...&url=...
///
/// Scrapes the watch page for the canonical title, then enriches from
/// TMDB. Enrichment is best-effort; the scrape is not.
pub async fn metadata(
    Query(params): Query<MetadataQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    const PATH: &str = "/content/metadata";
    let (Some(id), Some(url)) = (params.id, params.url) else {
        return ApiError::bad_request("id and url are required", PATH).into_response();
    };

    let cache_key = format!("metadata-{id}");
    if let Some(hit) = cached_json(&state, &cache_key) {
        return hit;
    }

    let page = match state.fmovies.watch_page(&url).await {
        Ok(page) => page,
        Err(e) => {
            error!("metadata scrape for {id} failed: {e}");
            return ApiError::internal("failed to fetch metadata", PATH).into_response();
        }
    };

    let enrichment = state
        .tmdb
        .lookup(&page.title, &page.kind, page.year.as_deref())
        .await;

    let response = MetadataResponse {
        fmovies_id: id.clone(),
        title: page.title,
        kind: page.kind,
        year: enrichment
            .as_ref()
            .and_then(|m| m.year.clone())
            .or(page.year),
        overview: enrichment.as_ref().and_then(|m| m.overview.clone()),
        poster_url: enrichment.as_ref().and_then(|m| m.poster_url.clone()),
        tmdb_id: enrichment.as_ref().map(|m| m.tmdb_id),
    };
    info!("fetched metadata for {id}");

    store_json(&state, &cache_key, &response);
    Json(response).into_response()
}

#[derive(Deserialize)]
pub struct StreamQuery {
    id: Option<String>,
    #[serde(rename = "type")]
    media_type: Option<String>,
}

/// GET /content/stream?id=...&type=movie|episode
///
/// The resolver core: either a complete stream result or one terminal
/// error, nothing in between.
pub async fn stream(
    Query(params): Query<StreamQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    const PATH: &str = "/content/stream";
    let (Some(id), Some(raw_type)) = (params.id, params.media_type) else {
        return ApiError::bad_request("id and type are required", PATH).into_response();
    };
    let media_type: MediaType = match raw_type.parse() {
        Ok(t) => t,
        Err(e) => return ApiError::bad_request(e, PATH).into_response(),
    };

    match state.resolver.resolve(&id, media_type).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!("stream resolution for {media_type} {id} failed: {e}");
            ApiError::internal(e.to_string(), PATH).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonsQuery {
    show_id: Option<String>,
}

/// GET /content/seasons?showId=...
pub async fn seasons(
    Query(params): Query<SeasonsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    const PATH: &str = "/content/seasons";
    let Some(show_id) = params.show_id else {
        return ApiError::bad_request("showId is required", PATH).into_response();
    };

    let cache_key = format!("seasons-{show_id}");
    if let Some(hit) = cached_json(&state, &cache_key) {
        return hit;
    }

    match state.fmovies.seasons(&show_id).await {
        Ok(seasons) => {
            info!("found {} seasons for show {show_id}", seasons.len());
            store_json(&state, &cache_key, &seasons);
            Json(seasons).into_response()
        }
        Err(e) => {
            error!("season listing for {show_id} failed: {e}");
            ApiError::internal("failed to fetch seasons", PATH).into_response()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodesQuery {
    season_id: Option<String>,
}

/// GET /content/episodes?seasonId=...
pub async fn episodes(
    Query(params): Query<EpisodesQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    const PATH: &str = "/content/episodes";
    let Some(season_id) = params.season_id else {
        return ApiError::bad_request("seasonId is required", PATH).into_response();
    };

    let cache_key = format!("episodes-{season_id}");
    if let Some(hit) = cached_json(&state, &cache_key) {
        return hit;
    }

    match state.fmovies.episodes(&season_id).await {
        Ok(episodes) => {
            info!("found {} episodes for season {season_id}", episodes.len());
            store_json(&state, &cache_key, &episodes);
            Json(episodes).into_response()
        }
        Err(e) => {
            error!("episode listing for {season_id} failed: {e}");
            ApiError::internal("failed to fetch episodes", PATH).into_response()
        }
    }
}
