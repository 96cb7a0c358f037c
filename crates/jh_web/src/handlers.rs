use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jh_core::{
    CitySuggestion, Comment, ContentType, Error, LocationCheck, NewsQuery, NewsResult, PlaceQuery,
    PlacesResult, PostCounters, Report,
};
use jh_storage::{LikeState, Resolution, SuppressionDecision, SuppressionSignal};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Provider { .. } | Error::AllProvidersFailed { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn required<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_input(format!("{} is required", name)).into());
    }
    Ok(value)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct NewsParams {
    #[serde(default)]
    query: String,
    category: Option<String>,
    country: Option<String>,
    language: Option<String>,
}

pub async fn fetch_news(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NewsParams>,
) -> Json<NewsResult> {
    let mut query = NewsQuery::new(params.query);
    query.category = params.category;
    query.country = params.country;
    if let Some(language) = params.language {
        query.language = language;
    }
    Json(state.services.fetch_news(&query).await)
}

#[derive(Debug, Deserialize)]
pub struct PlacesParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    location: String,
}

pub async fn search_places(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlacesParams>,
) -> Json<PlacesResult> {
    let query = PlaceQuery::new(params.query, params.location);
    Json(state.services.search_local_directory(&query).await)
}

#[derive(Debug, Deserialize)]
pub struct ValidateParams {
    #[serde(default)]
    city: String,
    #[serde(default)]
    country: String,
}

pub async fn validate_location(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValidateParams>,
) -> ApiResult<LocationCheck> {
    let city = required(&params.city, "city")?;
    let country = required(&params.country, "country")?;
    Ok(Json(state.services.validate_location(city, country).await))
}

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    input: String,
    #[serde(default)]
    country: String,
}

pub async fn city_suggestions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestionParams>,
) -> ApiResult<Vec<CitySuggestion>> {
    let country = required(&params.country, "country")?;
    Ok(Json(state.services.city_suggestions(&params.input, country).await))
}

#[derive(Debug, Deserialize)]
pub struct CitiesParams {
    #[serde(default)]
    country: String,
}

pub async fn fetch_cities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CitiesParams>,
) -> ApiResult<Vec<String>> {
    let country = required(&params.country, "country")?;
    Ok(Json(state.services.fetch_cities(country).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostBody {
    post_id: String,
}

pub async fn register_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewPostBody>,
) -> Result<(StatusCode, Json<PostCounters>), ApiError> {
    let post = state.moderator.register_post(&body.post_id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> ApiResult<PostCounters> {
    let post = state
        .moderator
        .store()
        .get_post(&post_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("post {}", post_id)))?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeBody {
    user_id: String,
}

pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    Json(body): Json<LikeBody>,
) -> ApiResult<LikeState> {
    Ok(Json(state.moderator.toggle_like(&post_id, &body.user_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    author_id: String,
    content: String,
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Comment> {
    let comment = state
        .moderator
        .add_comment(&post_id, &body.author_id, &body.content)
        .await?;
    Ok(Json(comment))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    reporter_id: String,
    content_type: ContentType,
    content_id: String,
    reason: String,
}

pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReportBody>,
) -> ApiResult<Report> {
    let report = state
        .moderator
        .submit_report(&body.reporter_id, body.content_type, &body.content_id, &body.reason)
        .await?;
    Ok(Json(report))
}

pub async fn open_reports(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Report>> {
    Ok(Json(state.moderator.open_reports().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveBody {
    action: Resolution,
    moderator_id: String,
}

pub async fn resolve_report(
    State(state): State<Arc<AppState>>,
    Path(report_id): Path<String>,
    Json(body): Json<ResolveBody>,
) -> ApiResult<Report> {
    let report = state
        .moderator
        .resolve_report(&report_id, body.action, &body.moderator_id)
        .await?;
    Ok(Json(report))
}

pub async fn suppression(
    State(state): State<Arc<AppState>>,
    Json(signal): Json<SuppressionSignal>,
) -> Json<SuppressionDecision> {
    Json(state.moderator.should_suppress(&signal))
}
