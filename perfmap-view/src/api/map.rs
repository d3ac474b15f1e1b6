//! Performance-map view API handlers
//!
//! The thin HTTP surface standing in for the out-of-scope front end: page
//! state queries, arrow-key navigation, on-demand detail, and rating
//! submission.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::models::{SubmissionDetail, WorkItemId};
use crate::services::{DetailOutcome, NavKey, PageView, RatingOutcome};
use crate::AppState;

/// GET /api/map query parameters; present parameters apply the matching
/// orchestrator trigger before the snapshot is taken
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub search: Option<String>,
}

/// POST /api/map/navigate request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateRequest {
    pub key: NavKey,
    /// Whether the search input currently has focus (navigation is ignored
    /// while typing)
    #[serde(default)]
    pub search_focused: bool,
}

/// POST /api/map/items/{id}/rating request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub rating: u8,
}

/// GET /api/map/items/{id} response
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DetailResponse {
    /// Submission found; review attached when one exists
    #[serde(rename_all = "camelCase")]
    Loaded { detail: SubmissionDetail },
    /// Benign empty state: the item has not been submitted yet
    NotSubmitted,
}

/// GET /api/map
///
/// Applies any provided query-state changes (each one a refresh trigger; a
/// trigger landing while a run is in flight is dropped by the single-flight
/// guard) and returns the page view snapshot.
pub async fn get_map(
    State(state): State<AppState>,
    Query(params): Query<MapQuery>,
) -> Json<PageView> {
    let orchestrator = &state.orchestrator;
    let current = orchestrator.query().await;
    let mut triggered = false;

    if let Some(search) = params.search {
        if search != current.search {
            orchestrator.set_search(search).await;
            triggered = true;
        }
    }

    if let Some(per_page) = params.per_page {
        if per_page != current.per_page {
            orchestrator.set_per_page(per_page).await;
            triggered = true;
        }
    }

    if let Some(page) = params.page {
        if page != orchestrator.query().await.page {
            orchestrator.set_page(page).await;
            triggered = true;
        }
    }

    // No state change: still a trigger (initial mount load)
    if !triggered {
        orchestrator.sync().await;
    }

    Json(orchestrator.page_view().await)
}

/// POST /api/map/navigate
///
/// Arrow-key page navigation (±1 page, clamped); ignored while the search
/// input has focus.
pub async fn navigate(
    State(state): State<AppState>,
    Json(request): Json<NavigateRequest>,
) -> Json<PageView> {
    state
        .orchestrator
        .navigate(request.key, request.search_focused)
        .await;
    Json(state.orchestrator.page_view().await)
}

/// GET /api/map/items/{id}
///
/// On-demand, cache-bypassing detail fetch. 404 from the dashboard is the
/// benign not-submitted state; a concurrent fetch is rejected with 409; a
/// timeout surfaces as 504 with a retry suggestion.
pub async fn get_item_detail(
    State(state): State<AppState>,
    Path(work_item_id): Path<WorkItemId>,
) -> ApiResult<Json<DetailResponse>> {
    match state.detail_fetcher.fetch(work_item_id).await {
        Ok(DetailOutcome::Loaded(detail)) => Ok(Json(DetailResponse::Loaded { detail: *detail })),
        Ok(DetailOutcome::NotSubmitted) => Ok(Json(DetailResponse::NotSubmitted)),
        Ok(DetailOutcome::Busy) => Err(ApiError::Conflict(
            "A detail fetch is already in progress".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// POST /api/map/items/{id}/rating
pub async fn submit_rating(
    State(state): State<AppState>,
    Path(work_item_id): Path<WorkItemId>,
    Json(request): Json<RatingRequest>,
) -> ApiResult<Json<RatingOutcome>> {
    let outcome = state
        .rating_submitter
        .submit(work_item_id, request.rating)
        .await?;
    Ok(Json(outcome))
}

/// Build performance-map routes
pub fn map_routes() -> Router<AppState> {
    Router::new()
        .route("/api/map", get(get_map))
        .route("/api/map/navigate", post(navigate))
        .route("/api/map/items/:id", get(get_item_detail))
        .route("/api/map/items/:id/rating", post(submit_rating))
}
