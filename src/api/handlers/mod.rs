use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, ViewError};
use crate::explorer::{DisplayPrefs, Explorer, ExplorerStatus, PrefsUpdate, ViewModel};
use crate::models::ChartView;
use crate::projector::FeatureDetail;
use crate::scattering::ScatteringGraph;
use crate::search::{SearchMatches, SearchMode};
use crate::source::HostCommand;
use crate::timeline::{TimelinePoint, TimelineSelection};

type AppState = Arc<Explorer>;
type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map an explorer error to a response.
///
/// Data problems are reported to the client as-is; they describe the
/// host's documents, not server internals.
fn api_error(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::View(ViewError::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
        Error::UnknownFeature(_) => StatusCode::NOT_FOUND,
        Error::Format(_) | Error::Document { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Fetch(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::warn!("Request rejected: {}", e);
    }
    (status, e.to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Data epochs
// ============================================================

pub async fn get_status(State(explorer): State<AppState>) -> Json<ExplorerStatus> {
    Json(explorer.status())
}

pub async fn refresh(State(explorer): State<AppState>) -> ApiResult<Json<ExplorerStatus>> {
    explorer.refresh().await.map_err(api_error)?;
    Ok(Json(explorer.status()))
}

// ============================================================
// Views
// ============================================================

pub async fn get_view(
    State(explorer): State<AppState>,
    Path(view): Path<String>,
) -> ApiResult<Json<ViewModel>> {
    let view = ChartView::from_str(&view)
        .ok_or((StatusCode::NOT_FOUND, format!("Unknown view: {}", view)))?;
    explorer.activate(view).await.map(Json).map_err(api_error)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefsResponse {
    pub prefs: DisplayPrefs,
    /// The current view, when the change re-rendered it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerendered: Option<ViewModel>,
}

pub async fn update_preferences(
    State(explorer): State<AppState>,
    Json(input): Json<PrefsUpdate>,
) -> ApiResult<Json<PrefsResponse>> {
    let rerendered = explorer.update_prefs(input).map_err(api_error)?;
    Ok(Json(PrefsResponse {
        prefs: explorer.prefs(),
        rerendered,
    }))
}

// ============================================================
// Features
// ============================================================

pub async fn get_feature(
    State(explorer): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FeatureDetail>> {
    explorer.feature_detail(&id).map(Json).map_err(api_error)
}

pub async fn select_feature(
    State(explorer): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<FeatureDetail>> {
    explorer.select_feature(&id).map(Json).map_err(api_error)
}

pub async fn get_scattering(
    State(explorer): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<ScatteringGraph>>> {
    explorer.scattering(&id).map(Json).map_err(api_error)
}

pub async fn highlight_feature(
    State(explorer): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    explorer
        .highlight_feature(&id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reveal_declaration(
    State(explorer): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    explorer
        .reveal_declaration(&id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Search
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub exact: bool,
    #[serde(default)]
    pub case: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub view: ChartView,
    /// Indices to highlight in `view`.
    pub highlight: Vec<usize>,
    #[serde(flatten)]
    pub matches: SearchMatches,
}

pub async fn search(
    State(explorer): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let mode = SearchMode {
        use_regex: query.regex,
        exact_match: query.exact,
        case_sensitive: query.case,
    };
    let matches = explorer
        .search(&query.q, mode)
        .map_err(|e| api_error(e.into()))?;
    let view = explorer.current_view();
    Ok(Json(SearchResponse {
        view,
        highlight: matches.indices_for(view),
        matches,
    }))
}

// ============================================================
// Timeline
// ============================================================

#[derive(Debug, Deserialize)]
pub struct TimelineFilterInput {
    #[serde(default)]
    pub selected: Vec<String>,
}

pub async fn filter_timeline(
    State(explorer): State<AppState>,
    Json(input): Json<TimelineFilterInput>,
) -> ApiResult<Json<TimelineSelection<TimelinePoint>>> {
    explorer
        .filter_timeline(&input.selected)
        .map(Json)
        .map_err(api_error)
}

// ============================================================
// Host
// ============================================================

#[derive(Debug, Deserialize)]
pub struct OpenPathInput {
    pub path: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

pub async fn open_path(
    State(explorer): State<AppState>,
    Json(input): Json<OpenPathInput>,
) -> ApiResult<StatusCode> {
    let lines = match (input.start, input.end) {
        (Some(start), Some(end)) => Some((start, end)),
        (Some(start), None) => Some((start, start)),
        (None, _) => None,
    };
    explorer
        .dispatch(HostCommand::OpenPath {
            path: input.path,
            lines,
        })
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
